// self
use crate::{http::ClientMode, obs::RequestOutcome};

/// Records a request outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(mode: ClientMode, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"nexus_session_request_total",
			"mode" => mode.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (mode, outcome);
	}
}

/// Records how many registry entries a sweep removed.
pub fn record_evictions(count: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("nexus_session_evicted_total").increment(count as u64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = count;
	}
}
