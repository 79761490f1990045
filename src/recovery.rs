//! Inbound middleware that recovers from `401 Unauthorized` responses.
//!
//! | response | action |
//! | --- | --- |
//! | transport error, or any status other than 401 | passed through unchanged |
//! | 401 from the refresher endpoint | token pair cleared, [`Error::AuthFailure`] returned |
//! | 401 from any other endpoint | shared refresh awaited, original request resubmitted once |
//!
//! The resubmission only runs the middleware registered after this one, so a second 401 is
//! returned to the caller as-is instead of triggering another recovery.

// crates.io
use http::Extensions;
use reqwest::{Request, Response, StatusCode};
use reqwest_middleware::{Middleware, Next};
// self
use crate::{
	_prelude::*,
	gate,
	obs::{self, Outcome, Stage, StageSpan},
	refresh::RefreshCoordinator,
};

/// Middleware implementing the reactive half of the refresh engine.
#[derive(Clone, Debug)]
pub struct ResponseRecovery {
	coordinator: RefreshCoordinator,
}
impl ResponseRecovery {
	/// Creates a recovery step backed by `coordinator`.
	pub fn new(coordinator: RefreshCoordinator) -> Self {
		Self { coordinator }
	}

	fn reject_refresher(&self, url: &Url) -> Error {
		#[cfg(feature = "tracing")]
		tracing::warn!(endpoint = %url, "refresher endpoint answered 401; clearing the token pair");

		if let Err(e) = self.coordinator.store().clear_pair() {
			return e.into();
		}

		obs::record_outcome(Stage::Recovery, Outcome::Failure);

		Error::AuthFailure { endpoint: url.to_string() }
	}
}
#[async_trait::async_trait]
impl Middleware for ResponseRecovery {
	async fn handle(
		&self,
		req: Request,
		extensions: &mut Extensions,
		next: Next<'_>,
	) -> reqwest_middleware::Result<Response> {
		let config = self.coordinator.config();
		let url = req.url().clone();
		let targets_refresher = config.is_refresher_endpoint(&url);
		// Streaming bodies cannot be replayed; such requests simply skip recovery.
		let replay = if targets_refresher { None } else { req.try_clone() };
		let response = next.clone().run(req, extensions).await?;

		if response.status() != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}
		if targets_refresher {
			return Err(self.reject_refresher(&url).into());
		}

		let Some(mut replay) = replay else {
			#[cfg(feature = "tracing")]
			tracing::debug!(target_url = %url, "401 on a non-replayable request; returning it");

			return Ok(response);
		};
		let span = StageSpan::new(Stage::Recovery, url.as_str());

		obs::record_outcome(Stage::Recovery, Outcome::Attempt);

		let token = match span.instrument(self.coordinator.obtain_fresh_access_token()).await {
			Ok(token) => token,
			Err(failure) => {
				obs::record_outcome(Stage::Recovery, Outcome::Failure);

				return Err(Error::from(failure).into());
			},
		};

		gate::authorize(&mut replay, config.scheme, &token)?;

		#[cfg(feature = "tracing")]
		tracing::debug!(target_url = %url, "resubmitting the request with the renewed token");

		let outcome = next.run(replay, extensions).await;

		obs::record_outcome(Stage::Recovery, resubmission_outcome(&outcome));

		outcome
	}
}

fn resubmission_outcome<T, E>(result: &Result<T, E>) -> Outcome {
	if result.is_ok() { Outcome::Success } else { Outcome::Failure }
}
