// self
use crate::{
	_prelude::*,
	config::{AuthScheme, RefresherConfig},
	error::ConfigError,
	store::{BackendKind, StorageKey},
	strategy::{DefaultRefresherStrategy, RefresherStrategy},
};

/// Builder for [`RefresherConfig`] values.
pub struct RefresherConfigBuilder {
	/// Raw base URL.
	pub base_url: String,
	/// Raw refresher endpoint (absolute or base-relative).
	pub refresher_endpoint: Option<String>,
	/// Access token location.
	pub access_token_key: Option<StorageKey>,
	/// Refresh token location.
	pub refresh_token_key: Option<StorageKey>,
	/// Header rendering for the access token.
	pub scheme: AuthScheme,
	/// Expiry leeway applied by the request gate.
	pub expiry_leeway: Duration,
	/// Refresher exchange strategy.
	pub strategy: Arc<dyn RefresherStrategy>,
}
impl RefresherConfigBuilder {
	/// Creates a builder for the API rooted at `base_url`.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			refresher_endpoint: None,
			access_token_key: None,
			refresh_token_key: None,
			scheme: AuthScheme::default(),
			expiry_leeway: Duration::ZERO,
			strategy: Arc::new(DefaultRefresherStrategy),
		}
	}

	/// Sets the refresher endpoint; relative paths are appended to the base URL.
	pub fn refresher_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.refresher_endpoint = Some(endpoint.into());

		self
	}

	/// Sets where the access token lives.
	pub fn access_token_storage(mut self, backend: BackendKind, key: impl Into<String>) -> Self {
		self.access_token_key = Some(StorageKey::new(backend, key));

		self
	}

	/// Sets where the refresh token lives.
	pub fn refresh_token_storage(mut self, backend: BackendKind, key: impl Into<String>) -> Self {
		self.refresh_token_key = Some(StorageKey::new(backend, key));

		self
	}

	/// Selects `Bearer <token>` (`true`) or the raw token (`false`).
	pub fn bearer(mut self, is_bearer: bool) -> Self {
		self.scheme = AuthScheme::from_bearer_flag(is_bearer);

		self
	}

	/// Overrides the expiry leeway; negative values clamp to zero.
	pub fn expiry_leeway(mut self, leeway: Duration) -> Self {
		self.expiry_leeway = if leeway.is_negative() { Duration::ZERO } else { leeway };

		self
	}

	/// Replaces the payload generator and token extractors.
	pub fn strategy(mut self, strategy: impl 'static + RefresherStrategy) -> Self {
		self.strategy = Arc::new(strategy);

		self
	}

	/// Validates the builder and produces a [`RefresherConfig`].
	pub fn build(self) -> Result<RefresherConfig, ConfigError> {
		let base_url = Url::parse(&self.base_url)
			.map_err(|source| ConfigError::InvalidBaseUrl { url: self.base_url.clone(), source })?;
		let endpoint = self
			.refresher_endpoint
			.as_deref()
			.map(str::trim)
			.filter(|endpoint| !endpoint.is_empty())
			.ok_or(ConfigError::MissingRefresherEndpoint)?;
		let refresher_endpoint = resolve_endpoint(&base_url, endpoint)?;
		let access_token_key = validate_key(self.access_token_key, "access")?;
		let refresh_token_key = validate_key(self.refresh_token_key, "refresh")?;

		Ok(RefresherConfig {
			base_url,
			refresher_endpoint,
			access_token_key,
			refresh_token_key,
			scheme: self.scheme,
			expiry_leeway: self.expiry_leeway,
			strategy: self.strategy,
		})
	}
}
impl Debug for RefresherConfigBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefresherConfigBuilder")
			.field("base_url", &self.base_url)
			.field("refresher_endpoint", &self.refresher_endpoint)
			.field("access_token_key", &self.access_token_key)
			.field("refresh_token_key", &self.refresh_token_key)
			.field("scheme", &self.scheme)
			.field("expiry_leeway", &self.expiry_leeway)
			.finish()
	}
}

/// Absolute endpoints are used as-is; anything else is appended to the base URL.
fn resolve_endpoint(base_url: &Url, endpoint: &str) -> Result<Url, ConfigError> {
	let invalid =
		|source| ConfigError::InvalidRefresherEndpoint { endpoint: endpoint.to_owned(), source };

	match Url::parse(endpoint) {
		Ok(url) => Ok(url),
		Err(url::ParseError::RelativeUrlWithoutBase) => {
			let joined = format!(
				"{}/{}",
				base_url.as_str().trim_end_matches('/'),
				endpoint.trim_start_matches('/')
			);

			Url::parse(&joined).map_err(invalid)
		},
		Err(source) => Err(invalid(source)),
	}
}

fn validate_key(key: Option<StorageKey>, token: &'static str) -> Result<StorageKey, ConfigError> {
	let key = key.ok_or(ConfigError::MissingStorage { token })?;

	if key.key.trim().is_empty() {
		return Err(ConfigError::EmptyStorageKey { token });
	}

	Ok(key)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn builder(base_url: &str) -> RefresherConfigBuilder {
		RefresherConfig::builder(base_url)
			.access_token_storage(BackendKind::Session, "at")
			.refresh_token_storage(BackendKind::Local, "rt")
	}

	#[test]
	fn relative_endpoints_append_to_the_base_url() {
		let config = builder("https://api.example.com/v1/")
			.refresher_endpoint("/token")
			.build()
			.expect("Relative endpoint should resolve.");

		assert_eq!(config.refresher_endpoint.as_str(), "https://api.example.com/v1/token");

		let config = builder("https://api.example.com")
			.refresher_endpoint("auth/refresh")
			.build()
			.expect("Relative endpoint should resolve.");

		assert_eq!(config.refresher_endpoint.as_str(), "https://api.example.com/auth/refresh");
	}

	#[test]
	fn absolute_endpoints_are_used_as_is() {
		let config = builder("https://api.example.com/v1")
			.refresher_endpoint("https://auth.example.com/refresh")
			.build()
			.expect("Absolute endpoint should be accepted.");

		assert_eq!(config.refresher_endpoint.as_str(), "https://auth.example.com/refresh");
	}

	#[test]
	fn missing_or_blank_endpoint_is_a_configuration_error() {
		let err = builder("https://api.example.com").build().expect_err("Endpoint is required.");

		assert_eq!(err, ConfigError::MissingRefresherEndpoint);

		let err = builder("https://api.example.com")
			.refresher_endpoint("  ")
			.build()
			.expect_err("Blank endpoint should be rejected.");

		assert_eq!(err, ConfigError::MissingRefresherEndpoint);
	}

	#[test]
	fn invalid_base_url_and_storage_keys_are_rejected() {
		let err = builder("not a url")
			.refresher_endpoint("/token")
			.build()
			.expect_err("Invalid base URL should be rejected.");

		assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

		let err = RefresherConfig::builder("https://api.example.com")
			.refresher_endpoint("/token")
			.access_token_storage(BackendKind::Session, "at")
			.build()
			.expect_err("Refresh storage is required.");

		assert_eq!(err, ConfigError::MissingStorage { token: "refresh" });

		let err = builder("https://api.example.com")
			.refresher_endpoint("/token")
			.access_token_storage(BackendKind::Cookie, "")
			.build()
			.expect_err("Empty keys should be rejected.");

		assert_eq!(err, ConfigError::EmptyStorageKey { token: "access" });
	}

	#[test]
	fn negative_leeway_clamps_to_zero() {
		let config = builder("https://api.example.com")
			.refresher_endpoint("/token")
			.expiry_leeway(Duration::seconds(-5))
			.build()
			.expect("Config should build.");

		assert_eq!(config.expiry_leeway, Duration::ZERO);
	}
}
