//! Crate-level error types shared by the coordinator, the middleware pair, and the stores.

// crates.io
use reqwest::header::InvalidHeaderValue;
// self
use crate::{_prelude::*, store::StoreError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The shared refresh operation failed.
	#[error(transparent)]
	Refresh(#[from] RefreshFailure),

	/// The refresher endpoint itself rejected the request as unauthorized.
	#[error("Refresher endpoint `{endpoint}` rejected the request as unauthorized.")]
	AuthFailure {
		/// Refresher endpoint that answered 401.
		endpoint: String,
	},
	/// Token cannot be carried in an `Authorization` header.
	#[error("Access token cannot be encoded as an Authorization header value.")]
	InvalidHeader(#[from] InvalidHeaderValue),
}
impl Error {
	/// Recovers the crate error carried inside a middleware error, if any.
	pub fn find(err: &reqwest_middleware::Error) -> Option<&Error> {
		match err {
			reqwest_middleware::Error::Middleware(inner) => inner.downcast_ref::<Error>(),
			reqwest_middleware::Error::Reqwest(_) => None,
		}
	}

	/// Returns `true` when the error represents a terminal authorization failure.
	pub fn is_auth_failure(&self) -> bool {
		matches!(self, Self::AuthFailure { .. })
	}
}
impl From<Error> for reqwest_middleware::Error {
	fn from(e: Error) -> Self {
		reqwest_middleware::Error::middleware(e)
	}
}

/// Configuration and validation failures raised before any network call.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Base URL cannot be parsed.
	#[error("Base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Raw base URL.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Settings document does not match the expected shape.
	#[error("Settings are invalid at `{path}`: {message}.")]
	InvalidSettings {
		/// Path to the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
	/// Refresher endpoint was not configured.
	#[error("Access token refresher endpoint is not configured.")]
	MissingRefresherEndpoint,
	/// Refresher endpoint cannot be resolved into an absolute URL.
	#[error("Refresher endpoint `{endpoint}` is invalid.")]
	InvalidRefresherEndpoint {
		/// Raw endpoint string.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Storage location for one of the tokens was not configured.
	#[error("Storage for the {token} token is not configured.")]
	MissingStorage {
		/// Which token (`access` or `refresh`).
		token: &'static str,
	},
	/// Storage key for one of the tokens is empty.
	#[error("Storage key for the {token} token must not be empty.")]
	EmptyStorageKey {
		/// Which token (`access` or `refresh`).
		token: &'static str,
	},
}

/// Failure of a shared refresh operation.
///
/// Every caller attached to the same in-flight refresh receives a clone of the same value.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshFailure {
	/// Refresher endpoint answered with a status other than 200.
	#[error("Refresher endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code returned by the refresher.
		status: u16,
	},
	/// Network failure while calling the refresher endpoint.
	#[error("Network error occurred while calling the refresher endpoint: {message}.")]
	Transport {
		/// Transport-supplied message.
		message: String,
	},
	/// Refresher answered 200 but no access token could be extracted.
	#[error("Refresher endpoint returned an unusable response: {message}.")]
	MalformedResponse {
		/// Extraction failure summary.
		message: String,
	},
	/// Token store failed while reading or persisting the pair.
	#[error("Token store failed during refresh: {0}")]
	Storage(#[from] StoreError),
}
impl RefreshFailure {
	/// Returns the HTTP status reported by the refresher, when available.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status } => Some(*status),
			_ => None,
		}
	}
}
impl From<ReqwestError> for RefreshFailure {
	fn from(e: ReqwestError) -> Self {
		Self::Transport { message: e.to_string() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unavailable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn crate_error_survives_the_middleware_boundary() {
		let middleware_error: reqwest_middleware::Error =
			Error::from(RefreshFailure::Status { status: 500 }).into();
		let found = Error::find(&middleware_error)
			.expect("Crate error should be recoverable from the middleware error.");

		assert!(matches!(found, Error::Refresh(RefreshFailure::Status { status: 500 })));
	}

	#[test]
	fn refresh_failure_reports_status_only_for_http_rejections() {
		assert_eq!(RefreshFailure::Status { status: 401 }.status(), Some(401));
		assert_eq!(RefreshFailure::Transport { message: "reset".into() }.status(), None);
	}
}
