//! Registration of the refresh engine on a reqwest client.
//!
//! [`TokenRefresher`] owns one [`RefreshCoordinator`] and hands out the two middleware that
//! share it. [`TokenRefresher::attach`] registers them in the required order: the gate first,
//! so recovery resubmissions skip it and go straight to the transport.

// crates.io
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
// self
use crate::{
	_prelude::*,
	config::RefresherConfig,
	gate::RequestGate,
	recovery::ResponseRecovery,
	refresh::RefreshCoordinator,
	store::{Backends, TokenPair, TokenStore},
};

/// Entry point bundling configuration, token store, and the shared coordinator.
#[derive(Clone, Debug)]
pub struct TokenRefresher {
	coordinator: RefreshCoordinator,
}
impl TokenRefresher {
	/// Creates a refresher storing tokens in `backends` at the locations named by `config`.
	pub fn new(config: RefresherConfig, backends: Backends) -> Self {
		let store = TokenStore::from_config(backends, &config);

		Self::with_store(config, store)
	}

	/// Creates a refresher around an existing token store.
	pub fn with_store(config: RefresherConfig, store: TokenStore) -> Self {
		Self { coordinator: RefreshCoordinator::new(config, store) }
	}

	/// Creates a refresher whose refresher calls go through `http_client`.
	///
	/// Pass a plain client (timeouts, proxies, TLS settings); never one carrying this crate's
	/// middleware.
	pub fn with_http_client(
		config: RefresherConfig,
		store: TokenStore,
		http_client: ReqwestClient,
	) -> Self {
		Self { coordinator: RefreshCoordinator::with_http_client(config, store, http_client) }
	}

	/// Outbound middleware sharing this refresher's coordinator.
	pub fn gate(&self) -> RequestGate {
		RequestGate::new(self.coordinator.clone())
	}

	/// Inbound middleware sharing this refresher's coordinator.
	pub fn recovery(&self) -> ResponseRecovery {
		ResponseRecovery::new(self.coordinator.clone())
	}

	/// Registers the gate and the recovery step on `builder`.
	pub fn attach(&self, builder: ClientBuilder) -> ClientBuilder {
		builder.with(self.gate()).with(self.recovery())
	}

	/// Wraps `client` with both middleware.
	pub fn client(&self, client: ReqwestClient) -> ClientWithMiddleware {
		self.attach(ClientBuilder::new(client)).build()
	}

	/// Stores a token pair obtained out of band (e.g. after signing in).
	pub fn store_tokens(&self, pair: &TokenPair) -> Result<()> {
		Ok(self.coordinator.store().store_pair(pair)?)
	}

	/// Forgets both tokens.
	pub fn clear_tokens(&self) -> Result<()> {
		Ok(self.coordinator.store().clear_pair()?)
	}

	/// Forces a refresh, sharing any refresh already in flight.
	pub async fn refresh(&self) -> Result<String> {
		Ok(self.coordinator.obtain_fresh_access_token().await?)
	}

	/// Shared coordinator.
	pub fn coordinator(&self) -> &RefreshCoordinator {
		&self.coordinator
	}

	/// Token store used by every component.
	pub fn store(&self) -> &TokenStore {
		self.coordinator.store()
	}
}
