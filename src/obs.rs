//! Optional observability helpers for client handles, the registry, and snapshot persistence.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `nexus_session.client` with the `mode` and
//!   `workspace` fields, plus events for evictions, skipped context headers, and snapshot
//!   failures.
//! - Enable `metrics` to increment the `nexus_session_request_total` counter for every
//!   attempt/send/block/failure, labeled by `mode` + `outcome`, and the
//!   `nexus_session_evicted_total` counter for swept registry entries.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to [`ClientHandle::execute`](crate::http::ClientHandle::execute).
	Attempt,
	/// Request reached the wire and a response came back.
	Sent,
	/// A pre-send hook refused the request before transmission.
	Blocked,
	/// Transport failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Sent => "sent",
			RequestOutcome::Blocked => "blocked",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
