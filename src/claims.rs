//! Unverified expiry-claim decoding for JWT-shaped access tokens.
//!
//! Only the payload segment is inspected; signatures are never checked. The result is used
//! solely to decide whether a token is worth sending, never to trust its contents.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserializer, de::Error as _};
// self
use crate::_prelude::*;

/// Claims extracted from an access token's payload segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct DecodedClaims {
	/// Expiry instant in seconds since the Unix epoch, fractional seconds truncated.
	#[serde(deserialize_with = "numeric_date")]
	pub exp: i64,
}
impl DecodedClaims {
	/// Returns `true` once `now + leeway` reaches the expiry instant.
	///
	/// A leeway pushing `now` past the representable range counts as expired.
	pub fn is_expired_at(&self, now: OffsetDateTime, leeway: Duration) -> bool {
		match now.checked_add(leeway) {
			Some(deadline) => deadline.unix_timestamp() >= self.exp,
			None => true,
		}
	}
}

/// Errors raised while decoding a token's claims.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token does not contain a payload segment.
	#[error("Token is missing its claims segment.")]
	MissingClaims,
	/// Payload segment is not valid base64url.
	#[error("Token claims segment is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload segment is not a JSON object with an integer `exp`.
	#[error("Token claims are malformed at `{path}`.")]
	Claims {
		/// Path to the offending field.
		path: String,
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Claims { path, source: e.into_inner() }
	}
}

// NumericDate allows fractional seconds.
fn numeric_date<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	let seconds = f64::deserialize(deserializer)?;

	if !seconds.is_finite() {
		return Err(D::Error::custom("exp must be a finite number"));
	}

	Ok(seconds.trunc() as i64)
}

/// Decodes the expiry claim of `token` without verifying it.
pub fn decode(token: &str) -> Result<DecodedClaims, DecodeError> {
	let segment = token
		.split('.')
		.nth(1)
		.map(|s| s.trim_end_matches('='))
		.filter(|s| !s.is_empty())
		.ok_or(DecodeError::MissingClaims)?;
	let bytes = URL_SAFE_NO_PAD.decode(segment)?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	Ok(serde_path_to_error::deserialize(&mut de)?)
}

/// Returns `true` when `token` is expired at `now`, treating undecodable tokens as expired.
pub fn is_expired(token: &str, now: OffsetDateTime, leeway: Duration) -> bool {
	match decode(token) {
		Ok(claims) => claims.is_expired_at(now, leeway),
		Err(_e) => {
			#[cfg(feature = "tracing")]
			tracing::debug!(error = %_e, "access token is undecodable; treating it as expired");

			true
		},
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::_preludet::jwt_expiring_at;

	#[test]
	fn decodes_exp_from_payload_segment() {
		let expires_at = macros::datetime!(2030-01-01 00:00 UTC);
		let claims = decode(&jwt_expiring_at(expires_at)).expect("Fixture token should decode.");

		assert_eq!(claims.exp, expires_at.unix_timestamp());
	}

	#[test]
	fn tolerates_padded_payload_segments() {
		let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":10}"#);
		let claims = decode(&format!("h.{payload}.s")).expect("Padded payload should decode.");

		assert_eq!(claims.exp, 10);
	}

	#[test]
	fn rejects_tokens_without_claims_segment() {
		assert!(matches!(decode(""), Err(DecodeError::MissingClaims)));
		assert!(matches!(decode("opaque-token"), Err(DecodeError::MissingClaims)));
		assert!(matches!(decode("header."), Err(DecodeError::MissingClaims)));
	}

	#[test]
	fn rejects_invalid_base64_and_missing_exp() {
		assert!(matches!(decode("h.***.s"), Err(DecodeError::Base64(_))));

		let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"x"}"#);

		assert!(matches!(decode(&format!("h.{payload}.s")), Err(DecodeError::Claims { .. })));

		let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":"soon"}"#);
		let err = decode(&format!("h.{payload}.s")).expect_err("String exp should be rejected.");

		assert!(matches!(err, DecodeError::Claims { ref path, .. } if path == "exp"));
	}

	#[test]
	fn expiry_compares_against_now_and_leeway() {
		let now = macros::datetime!(2030-01-01 00:00 UTC);
		let claims = DecodedClaims { exp: (now + Duration::seconds(30)).unix_timestamp() };

		assert!(!claims.is_expired_at(now, Duration::ZERO));
		assert!(claims.is_expired_at(now, Duration::seconds(30)));
		assert!(claims.is_expired_at(now + Duration::minutes(1), Duration::ZERO));
	}

	#[test]
	fn fractional_exp_is_truncated() {
		let payload = URL_SAFE_NO_PAD.encode(br#"{"exp":4102444800.5}"#);
		let claims = decode(&format!("h.{payload}.s")).expect("Fractional exp should decode.");

		assert_eq!(claims.exp, 4_102_444_800);
		assert!(!is_expired(&format!("h.{payload}.s"), OffsetDateTime::now_utc(), Duration::ZERO));
	}

	#[test]
	fn overflowing_leeway_counts_as_expired_instead_of_panicking() {
		let now = OffsetDateTime::now_utc();

		assert!(is_expired(&jwt_expiring_at(now + Duration::hours(1)), now, Duration::MAX));
		assert!(DecodedClaims { exp: i64::MAX }.is_expired_at(now, Duration::MAX));
	}

	#[test]
	fn undecodable_tokens_count_as_expired() {
		let now = OffsetDateTime::now_utc();

		assert!(is_expired("not-a-jwt", now, Duration::ZERO));
		assert!(is_expired("", now, Duration::ZERO));
		assert!(!is_expired(&jwt_expiring_at(now + Duration::hours(1)), now, Duration::ZERO));
	}
}
