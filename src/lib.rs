//! Single-flight OAuth 2.0 access-token renewal for reqwest: proactive expiry gating, reactive
//! 401 recovery, and pluggable token storage.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod obs;
pub mod recovery;
pub mod refresh;
pub mod store;
pub mod strategy;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests and demos; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		config::RefresherConfig,
		store::{BackendKind, Backends, TokenStore},
	};

	/// Storage key used for access tokens by the test fixtures.
	pub const ACCESS_KEY: &str = "access_token";
	/// Storage key used for refresh tokens by the test fixtures.
	pub const REFRESH_KEY: &str = "refresh_token";

	/// Builds an unsigned JWT-shaped token whose `exp` claim equals `expires_at`.
	pub fn jwt_expiring_at(expires_at: OffsetDateTime) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD
			.encode(format!(r#"{{"sub":"fixture","exp":{}}}"#, expires_at.unix_timestamp()));

		format!("{header}.{payload}.signature")
	}

	/// Token that expired an hour ago.
	pub fn expired_jwt() -> String {
		jwt_expiring_at(OffsetDateTime::now_utc() - Duration::hours(1))
	}

	/// Token that stays valid for another hour.
	pub fn fresh_jwt() -> String {
		jwt_expiring_at(OffsetDateTime::now_utc() + Duration::hours(1))
	}

	/// Builds a bearer config pointing at `base_url` with a `/token` refresher endpoint and
	/// session-backed storage for both tokens.
	pub fn session_config(base_url: &str) -> RefresherConfig {
		RefresherConfig::builder(base_url)
			.refresher_endpoint("/token")
			.access_token_storage(BackendKind::Session, ACCESS_KEY)
			.refresh_token_storage(BackendKind::Session, REFRESH_KEY)
			.bearer(true)
			.build()
			.expect("Test refresher config should build.")
	}

	/// Builds an in-memory token store for `config`, seeded with the provided token pair.
	pub fn seeded_store(config: &RefresherConfig, access: &str, refresh: &str) -> TokenStore {
		let store = TokenStore::from_config(Backends::new(&config.base_url), config);

		store.set_access_token(access).expect("Seeding the access token should succeed.");
		store.set_refresh_token(refresh).expect("Seeding the refresh token should succeed.");

		store
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use reqwest_middleware;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

pub use client::TokenRefresher;
pub use config::{AuthScheme, RefresherConfig, RefresherSettings};
pub use error::{ConfigError, Error, RefreshFailure, Result};
pub use gate::RequestGate;
pub use recovery::ResponseRecovery;
pub use refresh::RefreshCoordinator;
pub use store::{BackendKind, StorageKey, TokenPair, TokenStore};
pub use strategy::{DefaultRefresherStrategy, RefresherResponse, RefresherStrategy};
