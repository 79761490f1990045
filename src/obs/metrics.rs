// self
use crate::obs::{Outcome, Stage};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_outcome(stage: Stage, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_refresher_stage_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}
