//! Cookie-jar [`StorageBackend`] scoped to the API origin.
//!
//! Entries are written as host-only cookies on the configured origin, so a reqwest client
//! built with the same jar (`ClientBuilder::cookie_provider`) sends them along with every
//! request to that origin.

// crates.io
use reqwest::cookie::{CookieStore, Jar};
// self
use crate::{
	_prelude::*,
	store::{StorageBackend, StoreError},
};

/// Storage backend that reads and writes cookies in a shared [`Jar`].
#[derive(Clone)]
pub struct CookieBackend {
	jar: Arc<Jar>,
	origin: Url,
}
impl CookieBackend {
	/// Creates a backend storing cookies for `origin` in `jar`.
	pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
		Self { jar, origin }
	}

	/// Jar shared with the backend; hand it to the reqwest client builder to send the cookies.
	pub fn jar(&self) -> Arc<Jar> {
		self.jar.clone()
	}

	fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
		if key.is_empty() || !key.bytes().all(is_token_byte) {
			return Err(StoreError::Backend { message: format!("Invalid cookie name `{key}`") });
		}
		if !value.bytes().all(is_cookie_value_byte) {
			return Err(StoreError::Backend {
				message: format!("Value for cookie `{key}` contains forbidden characters"),
			});
		}

		self.jar.add_cookie_str(&format!("{key}={value}; Path=/"), &self.origin);

		Ok(())
	}
}
impl Debug for CookieBackend {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CookieBackend").field("origin", &self.origin.as_str()).finish()
	}
}
impl StorageBackend for CookieBackend {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		let Some(header) = self.jar.cookies(&self.origin) else {
			return Ok(None);
		};
		let header = header.to_str().map_err(|e| StoreError::Serialization {
			message: format!("Cookie header is not valid text: {e}"),
		})?;
		let value = header
			.split(';')
			.filter_map(|pair| pair.trim().split_once('='))
			.find(|(name, _)| *name == key)
			.map(|(_, value)| value.to_owned())
			.filter(|value| !value.is_empty());

		Ok(value)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.write(key, value)
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.write(key, "")
	}
}

// RFC 6265 cookie-name token characters.
fn is_token_byte(b: u8) -> bool {
	b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}

// RFC 6265 cookie-octet.
fn is_cookie_value_byte(b: u8) -> bool {
	b.is_ascii_graphic() && !b"\",;\\".contains(&b)
}
