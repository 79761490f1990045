//! Token persistence: backend contract, built-in backends, and the access/refresh pair view.

pub mod cookie;
pub mod file;
pub mod memory;

pub use cookie::CookieBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;

// self
use crate::{_prelude::*, config::RefresherConfig};

/// Key/value contract implemented by concrete storage media.
///
/// Implementations are synchronous; callers treat any returned error as fatal.
pub trait StorageBackend
where
	Self: Send + Sync,
{
	/// Returns the stored value, if present.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores or replaces a value.
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes a value; removing a missing key is not an error.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`StorageBackend`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// The three storage media a token can be placed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
	/// Durable storage that survives restarts.
	#[serde(rename = "localStorage")]
	Local,
	/// Storage scoped to the current process.
	#[serde(rename = "sessionStorage")]
	Session,
	/// Cookies scoped to the API origin.
	#[serde(rename = "cookie")]
	Cookie,
}
impl BackendKind {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			BackendKind::Local => "localStorage",
			BackendKind::Session => "sessionStorage",
			BackendKind::Cookie => "cookie",
		}
	}
}
impl Display for BackendKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Storage location of a single token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
	/// Medium holding the value.
	pub backend: BackendKind,
	/// Key inside that medium.
	pub key: String,
}
impl StorageKey {
	/// Builds a key for the provided medium.
	pub fn new(backend: BackendKind, key: impl Into<String>) -> Self {
		Self { backend, key: key.into() }
	}
}

/// Access token plus optional rotated refresh token returned by the refresher.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
	/// Newly issued access token.
	pub access_token: String,
	/// Rotated refresh token, when the refresher issued one.
	pub refresh_token: Option<String>,
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Backend table resolving each [`BackendKind`] to a concrete implementation.
#[derive(Clone)]
pub struct Backends {
	/// Backend used for [`BackendKind::Local`].
	pub local: Arc<dyn StorageBackend>,
	/// Backend used for [`BackendKind::Session`].
	pub session: Arc<dyn StorageBackend>,
	/// Backend used for [`BackendKind::Cookie`].
	pub cookie: Arc<dyn StorageBackend>,
}
impl Backends {
	/// In-process defaults: memory maps for local and session storage plus a private cookie
	/// jar scoped to `origin`.
	///
	/// Swap `local` for a [`FileBackend`] when tokens must survive restarts.
	pub fn new(origin: &Url) -> Self {
		Self {
			local: Arc::new(MemoryBackend::default()),
			session: Arc::new(MemoryBackend::default()),
			cookie: Arc::new(CookieBackend::new(Default::default(), origin.clone())),
		}
	}

	/// Replaces the local-storage backend.
	pub fn with_local(mut self, backend: impl 'static + StorageBackend) -> Self {
		self.local = Arc::new(backend);

		self
	}

	/// Replaces the session-storage backend.
	pub fn with_session(mut self, backend: impl 'static + StorageBackend) -> Self {
		self.session = Arc::new(backend);

		self
	}

	/// Replaces the cookie backend.
	pub fn with_cookie(mut self, backend: impl 'static + StorageBackend) -> Self {
		self.cookie = Arc::new(backend);

		self
	}

	/// Returns the backend for `kind`.
	pub fn resolve(&self, kind: BackendKind) -> &dyn StorageBackend {
		match kind {
			BackendKind::Local => self.local.as_ref(),
			BackendKind::Session => self.session.as_ref(),
			BackendKind::Cookie => self.cookie.as_ref(),
		}
	}
}
impl Debug for Backends {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Backends(..)")
	}
}

/// Access/refresh token view over a [`Backends`] table.
///
/// Absent values read back as the empty string, so "no token" and "empty token" are the same
/// state.
#[derive(Clone, Debug)]
pub struct TokenStore {
	backends: Backends,
	access: StorageKey,
	refresh: StorageKey,
}
impl TokenStore {
	/// Creates a store that keeps the pair under the provided locations.
	pub fn new(backends: Backends, access: StorageKey, refresh: StorageKey) -> Self {
		Self { backends, access, refresh }
	}

	/// Creates a store using the locations configured in `config`.
	pub fn from_config(backends: Backends, config: &RefresherConfig) -> Self {
		Self::new(backends, config.access_token_key.clone(), config.refresh_token_key.clone())
	}

	/// Reads `key` from `backend`, defaulting to the empty string.
	pub fn get(&self, backend: BackendKind, key: &str) -> Result<String, StoreError> {
		Ok(self.backends.resolve(backend).get(key)?.unwrap_or_default())
	}

	/// Writes `value` under `key` in `backend`.
	pub fn set(&self, backend: BackendKind, key: &str, value: &str) -> Result<(), StoreError> {
		self.backends.resolve(backend).set(key, value)
	}

	/// Current access token, or the empty string.
	pub fn access_token(&self) -> Result<String, StoreError> {
		self.get(self.access.backend, &self.access.key)
	}

	/// Current refresh token, or the empty string.
	pub fn refresh_token(&self) -> Result<String, StoreError> {
		self.get(self.refresh.backend, &self.refresh.key)
	}

	/// Replaces the access token.
	pub fn set_access_token(&self, value: &str) -> Result<(), StoreError> {
		self.set(self.access.backend, &self.access.key, value)
	}

	/// Replaces the refresh token.
	pub fn set_refresh_token(&self, value: &str) -> Result<(), StoreError> {
		self.set(self.refresh.backend, &self.refresh.key, value)
	}

	/// Persists a refresher result; an absent refresh token keeps the stored one.
	pub fn store_pair(&self, pair: &TokenPair) -> Result<(), StoreError> {
		self.set_access_token(&pair.access_token)?;

		if let Some(refresh) = &pair.refresh_token {
			self.set_refresh_token(refresh)?;
		}

		Ok(())
	}

	/// Clears both tokens from their configured locations.
	pub fn clear_pair(&self) -> Result<(), StoreError> {
		self.backends.resolve(self.access.backend).remove(&self.access.key)?;
		self.backends.resolve(self.refresh.backend).remove(&self.refresh.key)
	}

	/// Location of the access token.
	pub fn access_key(&self) -> &StorageKey {
		&self.access
	}

	/// Location of the refresh token.
	pub fn refresh_key(&self) -> &StorageKey {
		&self.refresh
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn origin() -> Url {
		Url::parse("https://api.example.com/").expect("Origin fixture should parse.")
	}

	fn store(access: BackendKind, refresh: BackendKind) -> TokenStore {
		TokenStore::new(
			Backends::new(&origin()),
			StorageKey::new(access, "access"),
			StorageKey::new(refresh, "refresh"),
		)
	}

	#[test]
	fn pair_round_trips_on_every_backend() {
		for kind in [BackendKind::Local, BackendKind::Session, BackendKind::Cookie] {
			let store = store(kind, kind);

			store
				.store_pair(&TokenPair {
					access_token: "a".into(),
					refresh_token: Some("r".into()),
				})
				.expect("Storing the pair should succeed.");

			assert_eq!(store.access_token().expect("Access read should succeed."), "a", "{kind}");
			assert_eq!(store.refresh_token().expect("Refresh read should succeed."), "r", "{kind}");
		}
	}

	#[test]
	fn absent_values_read_as_empty_strings() {
		let store = store(BackendKind::Session, BackendKind::Local);

		assert_eq!(store.access_token().expect("Access read should succeed."), "");
		assert_eq!(store.get(BackendKind::Cookie, "missing").expect("Read should succeed."), "");
	}

	#[test]
	fn clear_pair_empties_both_locations() {
		let store = store(BackendKind::Session, BackendKind::Cookie);

		store.set_access_token("a").expect("Access write should succeed.");
		store.set_refresh_token("r").expect("Refresh write should succeed.");
		store.clear_pair().expect("Clearing the pair should succeed.");

		assert_eq!(store.access_token().expect("Access read should succeed."), "");
		assert_eq!(store.refresh_token().expect("Refresh read should succeed."), "");
	}

	#[test]
	fn missing_refresh_token_keeps_the_stored_one() {
		let store = store(BackendKind::Session, BackendKind::Session);

		store.set_refresh_token("r1").expect("Refresh write should succeed.");
		store
			.store_pair(&TokenPair { access_token: "a2".into(), refresh_token: None })
			.expect("Storing the pair should succeed.");

		assert_eq!(store.access_token().expect("Access read should succeed."), "a2");
		assert_eq!(store.refresh_token().expect("Refresh read should succeed."), "r1");
	}

	#[test]
	fn backend_kind_uses_storage_labels() {
		let payload =
			serde_json::to_string(&BackendKind::Session).expect("BackendKind should serialize.");

		assert_eq!(payload, "\"sessionStorage\"");

		let kind: BackendKind =
			serde_json::from_str("\"cookie\"").expect("BackendKind should deserialize.");

		assert_eq!(kind, BackendKind::Cookie);
	}

	#[test]
	fn token_pair_debug_redacts_secrets() {
		let pair = TokenPair { access_token: "secret-a".into(), refresh_token: Some("r".into()) };
		let rendered = format!("{pair:?}");

		assert!(!rendered.contains("secret-a"));
		assert!(rendered.contains("<redacted>"));
	}
}
