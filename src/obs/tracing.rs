// self
use crate::{_prelude::*, http::ClientMode, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span wrapping one request issued through a client handle.
#[derive(Clone, Debug)]
pub struct ClientSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ClientSpan {
	/// Creates a new span tagged with the client mode and workspace.
	pub fn new(mode: ClientMode, workspace: Option<&str>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"nexus_session.client",
				mode = mode.as_str(),
				workspace = workspace.unwrap_or("-")
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (mode, workspace);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
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

/// Records that a registry entry aged out during a sweep.
pub fn entry_evicted(key: &str, age: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(key, age_ms = age.whole_milliseconds() as i64, "cleaning up stale entry");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, age);
	}
}

/// Records that the diagnostic context header was skipped.
pub fn context_header_skipped(reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%reason, "sending request without browser context header");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

/// Records that an authenticated request was refused for lack of an access token.
pub fn credential_missing(workspace: Option<&str>) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(workspace = workspace.unwrap_or("-"), "missing access token for request");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = workspace;
	}
}

/// Records a snapshot write that could not be completed.
pub fn snapshot_write_failed(key: &str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, %error, "failed to persist snapshot");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, error);
	}
}

/// Records a snapshot that was ignored because of a version mismatch.
pub fn snapshot_discarded(key: &str, version: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, version, "discarding snapshot written with another layout version");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, version);
	}
}

/// Records which factories the client gate installed.
pub fn clients_installed(source: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(source, "client factories installed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = source;
	}
}
