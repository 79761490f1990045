//! Single-flight refresher exchange shared by the request gate and the response recovery.
//!
//! [`RefreshCoordinator::obtain_fresh_access_token`] either starts a refresher call or hands
//! out a clone of the one already running, so any number of concurrent callers produce at most
//! one POST. The running exchange is a [`Shared`] future: whichever attached caller polls it
//! drives it, and every caller observes the same settled result. Once it settles, the
//! coordinator returns to [`RefreshState::Idle`] and the next caller starts a fresh attempt;
//! failures are never cached.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::StatusCode;
// self
use crate::{
	_prelude::*,
	config::RefresherConfig,
	error::RefreshFailure,
	obs::{self, Outcome, Stage, StageSpan},
	store::{TokenPair, TokenStore},
	strategy::RefresherResponse,
};

/// Future shared by every caller waiting on the same refresh.
pub type SharedRefresh = Shared<BoxFuture<'static, Result<String, RefreshFailure>>>;

/// Refresh state owned by a [`RefreshCoordinator`].
#[derive(Default)]
pub enum RefreshState {
	/// No refresher call is in flight.
	#[default]
	Idle,
	/// A refresher call is in flight.
	Running {
		/// Sequence number of the call, as counted by [`RefreshMetrics::attempts`].
		flight: u64,
		/// Result every waiter will observe.
		future: SharedRefresh,
	},
}
impl Debug for RefreshState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Idle => f.write_str("Idle"),
			Self::Running { flight, .. } =>
				f.debug_struct("Running").field("flight", flight).finish_non_exhaustive(),
		}
	}
}

/// Owner of the single-flight refresh protocol.
///
/// Cloning is cheap and every clone shares the same state, store, and counters.
#[derive(Clone)]
pub struct RefreshCoordinator(Arc<CoordinatorInner>);
impl RefreshCoordinator {
	/// Creates a coordinator that calls the refresher with a default reqwest client.
	pub fn new(config: RefresherConfig, store: TokenStore) -> Self {
		Self::with_http_client(config, store, ReqwestClient::default())
	}

	/// Creates a coordinator that calls the refresher with `http_client`.
	///
	/// The client must not carry the crate's middleware; the refresher call is made without
	/// an access token.
	pub fn with_http_client(
		config: RefresherConfig,
		store: TokenStore,
		http_client: ReqwestClient,
	) -> Self {
		Self(Arc::new(CoordinatorInner {
			config,
			store,
			http_client,
			state: Default::default(),
			metrics: Default::default(),
		}))
	}

	/// Returns the current access token's replacement, sharing any refresh already in flight.
	///
	/// On failure the stored token pair has been cleared before the result is delivered.
	pub fn obtain_fresh_access_token(&self) -> SharedRefresh {
		let mut state = self.0.state.lock();

		if let RefreshState::Running { future, .. } = &*state {
			self.0.metrics.record_joined();
			obs::record_outcome(Stage::Refresh, Outcome::Joined);

			#[cfg(feature = "tracing")]
			tracing::debug!("joining the refresh already in flight");

			return future.clone();
		}

		let flight = self.0.metrics.record_attempt();
		let future = CoordinatorInner::run(self.0.clone(), flight).boxed().shared();

		*state = RefreshState::Running { flight, future: future.clone() };

		future
	}

	/// Returns `true` while a refresher call is in flight.
	pub fn is_refreshing(&self) -> bool {
		matches!(*self.0.state.lock(), RefreshState::Running { .. })
	}

	/// Configuration the coordinator was built with.
	pub fn config(&self) -> &RefresherConfig {
		&self.0.config
	}

	/// Token store the coordinator persists into.
	pub fn store(&self) -> &TokenStore {
		&self.0.store
	}

	/// Counters for refresher calls.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.0.metrics
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("config", &self.0.config)
			.field("state", &*self.0.state.lock())
			.field("metrics", &self.0.metrics)
			.finish()
	}
}

struct CoordinatorInner {
	config: RefresherConfig,
	store: TokenStore,
	http_client: ReqwestClient,
	state: Mutex<RefreshState>,
	metrics: RefreshMetrics,
}
impl CoordinatorInner {
	async fn run(self: Arc<Self>, flight: u64) -> Result<String, RefreshFailure> {
		let span = StageSpan::new(Stage::Refresh, self.config.refresher_endpoint.as_str());

		obs::record_outcome(Stage::Refresh, Outcome::Attempt);

		let result = span.instrument(self.exchange()).await;

		match &result {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_outcome(Stage::Refresh, Outcome::Success);
			},
			Err(_failure) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_failure, "refresh failed; clearing the stored token pair");

				if let Err(_e) = self.store.clear_pair() {
					#[cfg(feature = "tracing")]
					tracing::error!(error = %_e, "failed to clear the stored token pair");
				}

				self.metrics.record_failure();
				obs::record_outcome(Stage::Refresh, Outcome::Failure);
			},
		}

		self.settle(flight);

		result
	}

	async fn exchange(&self) -> Result<String, RefreshFailure> {
		let strategy = self.config.strategy.as_ref();
		let refresh_token = self.store.refresh_token()?;
		let payload = strategy.payload(&refresh_token);
		let response = self
			.http_client
			.post(self.config.refresher_endpoint.clone())
			.json(&payload)
			.send()
			.await?;
		let status = response.status();

		if status != StatusCode::OK {
			return Err(RefreshFailure::Status { status: status.as_u16() });
		}

		let headers = response.headers().to_owned();
		let body = response.bytes().await?.to_vec();
		let response = RefresherResponse { status, headers, body };
		let pair = TokenPair {
			access_token: strategy.access_token(&response)?,
			refresh_token: strategy.refresh_token(&response),
		};

		self.store.store_pair(&pair)?;

		Ok(pair.access_token)
	}

	fn settle(&self, flight: u64) {
		let mut state = self.state.lock();

		if matches!(&*state, RefreshState::Running { flight: running, .. } if *running == flight) {
			*state = RefreshState::Idle;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[tokio::test]
	async fn unreachable_refresher_clears_the_pair_and_resets_state() {
		// Port 9 (discard) on localhost refuses connections on any sane test host.
		let config = session_config("http://127.0.0.1:9");
		let store = seeded_store(&config, "stale", "refresh");
		let coordinator = RefreshCoordinator::new(config, store.clone());
		let err = coordinator
			.obtain_fresh_access_token()
			.await
			.expect_err("Connection failures should reject the refresh.");

		assert!(matches!(err, RefreshFailure::Transport { .. }));
		assert_eq!(store.access_token().expect("Access read should succeed."), "");
		assert_eq!(store.refresh_token().expect("Refresh read should succeed."), "");
		assert!(!coordinator.is_refreshing());
		assert_eq!(coordinator.metrics().attempts(), 1);
		assert_eq!(coordinator.metrics().failures(), 1);
	}

	#[tokio::test]
	async fn callers_during_a_flight_share_it() {
		let config = session_config("http://127.0.0.1:9");
		let store = seeded_store(&config, "stale", "refresh");
		let coordinator = RefreshCoordinator::new(config, store);
		let first = coordinator.obtain_fresh_access_token();
		let second = coordinator.obtain_fresh_access_token();

		assert!(coordinator.is_refreshing());
		assert_eq!(coordinator.metrics().attempts(), 1);
		assert_eq!(coordinator.metrics().joined(), 1);

		let (first, second) = tokio::join!(first, second);

		assert_eq!(first, second);
		assert!(!coordinator.is_refreshing());

		// Settled failures are not cached.
		let _ = coordinator.obtain_fresh_access_token().await;

		assert_eq!(coordinator.metrics().attempts(), 2);
	}
}
