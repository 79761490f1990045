//! Strategy hooks that shape the refresher exchange.
//!
//! A strategy generates the POST payload from the stored refresh token and pulls the new token
//! pair back out of the refresher's response. The hooks work on crate-owned data so
//! implementations never touch reqwest types.

// crates.io
use reqwest::{StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{_prelude::*, error::RefreshFailure};

/// Payload generator and token extractors for the refresher endpoint.
///
/// Every hook has a default matching the `{ "token": ... }` request and the
/// `{ "accessToken": ..., "refreshToken": ... }` response shape. Override only what differs.
pub trait RefresherStrategy: Send + Sync {
	/// Builds the JSON body POSTed to the refresher endpoint.
	fn payload(&self, refresh_token: &str) -> Value {
		serde_json::json!({ "token": refresh_token })
	}

	/// Extracts the new access token from a 200 response.
	fn access_token(&self, response: &RefresherResponse) -> Result<String, RefreshFailure> {
		#[derive(Deserialize)]
		struct Body {
			#[serde(rename = "accessToken")]
			access_token: String,
		}

		let body = response.json::<Body>().map_err(|e| RefreshFailure::MalformedResponse {
			message: format!("{} at `{}`", e.inner(), e.path()),
		})?;

		if body.access_token.is_empty() {
			return Err(RefreshFailure::MalformedResponse {
				message: "accessToken is empty".into(),
			});
		}

		Ok(body.access_token)
	}

	/// Extracts the rotated refresh token, if the refresher issued one.
	fn refresh_token(&self, response: &RefresherResponse) -> Option<String> {
		#[derive(Deserialize)]
		struct Body {
			#[serde(rename = "refreshToken")]
			refresh_token: Option<String>,
		}

		response.json::<Body>().ok()?.refresh_token.filter(|token| !token.is_empty())
	}
}

/// Default strategy: `{ "token": refreshToken }` in, `accessToken` / `refreshToken` out.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRefresherStrategy;
impl RefresherStrategy for DefaultRefresherStrategy {}

/// Buffered refresher response handed to strategy extractors.
#[derive(Clone, Debug)]
pub struct RefresherResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl RefresherResponse {
	/// Deserializes the body as JSON, reporting the path of the first mismatch.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}
}
