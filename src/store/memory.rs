//! Thread-safe in-memory [`StorageBackend`] for session-scoped tokens and tests.

// self
use crate::{
	_prelude::*,
	store::{StorageBackend, StoreError},
};

type EntryMap = Arc<RwLock<HashMap<String, String>>>;

/// Storage backend that keeps entries in-process for the lifetime of the value.
///
/// Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend(EntryMap);
impl MemoryBackend {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl StorageBackend for MemoryBackend {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), value.to_owned());

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}
