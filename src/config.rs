//! Validated refresher configuration and its serde-facing settings form.

mod builder;

pub use builder::*;

// crates.io
use reqwest::header::{HeaderValue, InvalidHeaderValue};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	store::{BackendKind, StorageKey},
	strategy::RefresherStrategy,
};

/// How the access token is rendered into the `Authorization` header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AuthScheme {
	/// `Authorization: <token>`.
	#[default]
	Raw,
	/// `Authorization: Bearer <token>`.
	Bearer,
}
impl AuthScheme {
	/// Maps the `isBearer` flag onto a scheme.
	pub const fn from_bearer_flag(is_bearer: bool) -> Self {
		if is_bearer { Self::Bearer } else { Self::Raw }
	}

	/// Renders `token` into a sensitive header value.
	pub fn header_value(self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
		let mut value = match self {
			Self::Raw => HeaderValue::from_str(token)?,
			Self::Bearer => HeaderValue::from_str(&format!("Bearer {token}"))?,
		};

		value.set_sensitive(true);

		Ok(value)
	}
}

/// Fully resolved configuration shared by the coordinator and both middleware.
#[derive(Clone)]
pub struct RefresherConfig {
	/// Base URL of the API the client talks to.
	pub base_url: Url,
	/// Absolute URL of the token refresher endpoint.
	pub refresher_endpoint: Url,
	/// Location of the access token.
	pub access_token_key: StorageKey,
	/// Location of the refresh token.
	pub refresh_token_key: StorageKey,
	/// Header rendering for the access token.
	pub scheme: AuthScheme,
	/// Tokens expiring within this window are treated as already expired.
	pub expiry_leeway: Duration,
	/// Payload generator and token extractors for the refresher exchange.
	pub strategy: Arc<dyn RefresherStrategy>,
}
impl RefresherConfig {
	/// Starts a builder for the API rooted at `base_url`.
	pub fn builder(base_url: impl Into<String>) -> RefresherConfigBuilder {
		RefresherConfigBuilder::new(base_url)
	}

	/// Returns `true` when `url` addresses the refresher endpoint (query and fragment ignored).
	pub fn is_refresher_endpoint(&self, url: &Url) -> bool {
		let endpoint = &self.refresher_endpoint;

		url.scheme() == endpoint.scheme()
			&& url.host() == endpoint.host()
			&& url.port_or_known_default() == endpoint.port_or_known_default()
			&& url.path().trim_end_matches('/') == endpoint.path().trim_end_matches('/')
	}
}
impl Debug for RefresherConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefresherConfig")
			.field("base_url", &self.base_url.as_str())
			.field("refresher_endpoint", &self.refresher_endpoint.as_str())
			.field("access_token_key", &self.access_token_key)
			.field("refresh_token_key", &self.refresh_token_key)
			.field("scheme", &self.scheme)
			.field("expiry_leeway", &self.expiry_leeway)
			.finish()
	}
}

/// Serde form of the configuration, using the option names of the original client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefresherSettings {
	/// Base URL of the API.
	#[serde(rename = "baseURL")]
	pub base_url: String,
	/// Absolute or base-relative refresher endpoint.
	#[serde(rename = "accessTokenRefresherEndpoint")]
	pub access_token_refresher_endpoint: Option<String>,
	/// Medium holding the access token.
	#[serde(rename = "accessTokenStorage")]
	pub access_token_storage: BackendKind,
	/// Medium holding the refresh token.
	#[serde(rename = "refreshTokenStorage")]
	pub refresh_token_storage: BackendKind,
	/// Key of the access token.
	#[serde(rename = "accessTokenStorageKey")]
	pub access_token_storage_key: String,
	/// Key of the refresh token.
	#[serde(rename = "refreshTokenStorageKey")]
	pub refresh_token_storage_key: String,
	/// Selects `Bearer <token>` over the raw token.
	#[serde(rename = "isBearer", default)]
	pub is_bearer: bool,
	/// Seconds subtracted from every token's lifetime.
	#[serde(rename = "expiryLeewaySeconds", default)]
	pub expiry_leeway_seconds: u32,
}
impl RefresherSettings {
	/// Parses settings from a JSON document.
	pub fn from_json(json: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(&mut de).map_err(|e| {
			let path = e.path().to_string();

			ConfigError::InvalidSettings { path, message: e.into_inner().to_string() }.into()
		})
	}

	/// Converts the settings into a builder, so strategies can still be attached.
	pub fn into_builder(self) -> RefresherConfigBuilder {
		let mut builder = RefresherConfig::builder(self.base_url)
			.access_token_storage(self.access_token_storage, self.access_token_storage_key)
			.refresh_token_storage(self.refresh_token_storage, self.refresh_token_storage_key)
			.bearer(self.is_bearer)
			.expiry_leeway(Duration::seconds(self.expiry_leeway_seconds.into()));

		if let Some(endpoint) = self.access_token_refresher_endpoint {
			builder = builder.refresher_endpoint(endpoint);
		}

		builder
	}
}
impl TryFrom<RefresherSettings> for RefresherConfig {
	type Error = ConfigError;

	fn try_from(settings: RefresherSettings) -> Result<Self, Self::Error> {
		settings.into_builder().build()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn header_value_respects_scheme_and_is_sensitive() {
		let bearer = AuthScheme::Bearer.header_value("abc").expect("Header should encode.");
		let raw = AuthScheme::Raw.header_value("abc").expect("Header should encode.");

		assert_eq!(bearer, "Bearer abc");
		assert_eq!(raw, "abc");
		assert!(bearer.is_sensitive());
		assert!(AuthScheme::Raw.header_value("line\nbreak").is_err());
	}

	#[test]
	fn bearer_flag_defaults_to_raw() {
		assert_eq!(AuthScheme::default(), AuthScheme::Raw);
		assert_eq!(AuthScheme::from_bearer_flag(true), AuthScheme::Bearer);
	}

	#[test]
	fn settings_parse_original_option_names() {
		let settings = RefresherSettings::from_json(
			r#"{
				"baseURL": "https://api.example.com/v1",
				"accessTokenRefresherEndpoint": "/token",
				"accessTokenStorage": "localStorage",
				"refreshTokenStorage": "cookie",
				"accessTokenStorageKey": "at",
				"refreshTokenStorageKey": "rt",
				"isBearer": true
			}"#,
		)
		.expect("Settings fixture should parse.");
		let config = RefresherConfig::try_from(settings).expect("Settings should validate.");

		assert_eq!(config.refresher_endpoint.as_str(), "https://api.example.com/v1/token");
		assert_eq!(config.access_token_key, StorageKey::new(BackendKind::Local, "at"));
		assert_eq!(config.refresh_token_key, StorageKey::new(BackendKind::Cookie, "rt"));
		assert_eq!(config.scheme, AuthScheme::Bearer);
		assert_eq!(config.expiry_leeway, Duration::ZERO);
	}

	#[test]
	fn settings_report_the_offending_path() {
		let err = RefresherSettings::from_json(
			r#"{
				"baseURL": "https://api.example.com",
				"accessTokenStorage": "indexedDB",
				"refreshTokenStorage": "cookie",
				"accessTokenStorageKey": "at",
				"refreshTokenStorageKey": "rt"
			}"#,
		)
		.expect_err("Unknown storage kinds should be rejected.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::InvalidSettings { ref path, .. })
				if path == "accessTokenStorage"
		));
	}

	#[test]
	fn settings_without_endpoint_fail_before_any_network_call() {
		let settings = RefresherSettings {
			base_url: "https://api.example.com".into(),
			access_token_refresher_endpoint: None,
			access_token_storage: BackendKind::Session,
			refresh_token_storage: BackendKind::Session,
			access_token_storage_key: "at".into(),
			refresh_token_storage_key: "rt".into(),
			is_bearer: false,
			expiry_leeway_seconds: 0,
		};

		assert_eq!(
			RefresherConfig::try_from(settings).expect_err("Missing endpoint should be rejected."),
			ConfigError::MissingRefresherEndpoint
		);
	}

	#[test]
	fn refresher_endpoint_match_ignores_query_and_trailing_slash() {
		let config = RefresherConfig::builder("https://api.example.com")
			.refresher_endpoint("/auth/token")
			.access_token_storage(BackendKind::Session, "at")
			.refresh_token_storage(BackendKind::Session, "rt")
			.build()
			.expect("Config fixture should build.");
		let url = |raw: &str| Url::parse(raw).expect("URL fixture should parse.");

		assert!(config.is_refresher_endpoint(&url("https://api.example.com/auth/token?x=1")));
		assert!(config.is_refresher_endpoint(&url("https://api.example.com:443/auth/token/")));
		assert!(!config.is_refresher_endpoint(&url("https://api.example.com/auth/tokens")));
		assert!(!config.is_refresher_endpoint(&url("http://api.example.com/auth/token")));
	}
}
