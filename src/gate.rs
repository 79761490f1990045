//! Outbound middleware that attaches the current access token and renews it proactively.
//!
//! Every request gets the stored token in its `Authorization` header. When that token's `exp`
//! claim has passed (or cannot be decoded), the request waits on the shared refresh and is sent
//! with the renewed token instead, so a token already known to be expired never leaves the
//! process.

// crates.io
use http::Extensions;
use reqwest::{Request, Response, header::AUTHORIZATION};
use reqwest_middleware::{Middleware, Next};
// self
use crate::{
	_prelude::*,
	claims,
	config::AuthScheme,
	obs::{self, Outcome, Stage, StageSpan},
	refresh::RefreshCoordinator,
};

/// Middleware implementing the proactive half of the refresh engine.
#[derive(Clone, Debug)]
pub struct RequestGate {
	coordinator: RefreshCoordinator,
}
impl RequestGate {
	/// Creates a gate backed by `coordinator`.
	pub fn new(coordinator: RefreshCoordinator) -> Self {
		Self { coordinator }
	}

	/// Stamps `req` with the token to send, refreshing first when the stored one is expired.
	pub async fn prepare(&self, req: &mut Request) -> Result<()> {
		let config = self.coordinator.config();
		let token = self.coordinator.store().access_token()?;

		authorize(req, config.scheme, &token)?;

		if !claims::is_expired(&token, OffsetDateTime::now_utc(), config.expiry_leeway) {
			return Ok(());
		}

		let span = StageSpan::new(Stage::Gate, req.url().as_str());

		obs::record_outcome(Stage::Gate, Outcome::Attempt);

		let renewed = span.instrument(self.coordinator.obtain_fresh_access_token()).await;
		let renewed = match renewed {
			Ok(token) => token,
			Err(failure) => {
				obs::record_outcome(Stage::Gate, Outcome::Failure);

				return Err(failure.into());
			},
		};

		authorize(req, config.scheme, &renewed)?;
		obs::record_outcome(Stage::Gate, Outcome::Success);

		Ok(())
	}
}
#[async_trait::async_trait]
impl Middleware for RequestGate {
	async fn handle(
		&self,
		mut req: Request,
		extensions: &mut Extensions,
		next: Next<'_>,
	) -> reqwest_middleware::Result<Response> {
		self.prepare(&mut req).await?;

		next.run(req, extensions).await
	}
}

/// Overwrites the `Authorization` header of `req` with `token`.
pub(crate) fn authorize(req: &mut Request, scheme: AuthScheme, token: &str) -> Result<()> {
	req.headers_mut().insert(AUTHORIZATION, scheme.header_value(token)?);

	Ok(())
}
