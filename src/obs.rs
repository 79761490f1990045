//! Optional observability helpers for the refresh engine.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_refresher.stage` with a `stage`
//!   field (`refresh`, `gate`, `recovery`) plus debug/warn events at each decision point.
//! - Enable `metrics` to increment the `oauth2_refresher_stage_total` counter for every
//!   attempt/join/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Engine stages observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Single-flight refresher exchange.
	Refresh,
	/// Outbound expiry check.
	Gate,
	/// Inbound 401 recovery.
	Recovery,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Refresh => "refresh",
			Stage::Gate => "gate",
			Stage::Recovery => "recovery",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded per stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// A stage started work (refresh call issued, gate triggered, recovery resubmitted).
	Attempt,
	/// A caller attached to a refresh that was already running.
	Joined,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Joined => "joined",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
