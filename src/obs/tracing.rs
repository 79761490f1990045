// self
use crate::{_prelude::*, obs::Stage};

/// A span builder used by the engine stages.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage and request target.
	pub fn new(stage: Stage, target: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth2_refresher.stage", stage = stage.as_str(), target);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, target);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> impl Future<Output = Fut::Output> + use<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = StageSpan::new(Stage::Refresh, "https://api.example.com/token");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
