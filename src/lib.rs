//! Client-session plumbing for the Nexus platform: a shared credential store, token-gated
//! HTTP client handles, a first-call-wins client gate, and an ephemeral registry with
//! age-based sweeping, all owned by one explicitly constructed [`session::SessionContext`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod gate;
pub mod http;
pub mod obs;
pub mod registry;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		clock::ManualClock,
		config::ClientConfig,
		context::{BrowserContext, StaticContextSource},
		session::SessionContext,
		store::MemoryBackend,
	};

	/// Fixed instant used as "zero" by clock-driven tests.
	pub const TEST_EPOCH: OffsetDateTime = time::macros::datetime!(2025-01-01 00:00 UTC);

	/// Builds a [`ClientConfig`] pointing at the provided base URL.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig { base_url: Some(base_url.to_owned()), ..Default::default() }
	}

	/// Context source that always yields the same, fully populated browser context.
	pub fn test_context_source() -> StaticContextSource {
		StaticContextSource::new(BrowserContext::builder()
			.page_path("/chat")
			.page_url("https://app.example.com/chat")
			.user_agent("nexus-tests/1.0")
			.locale("en-GB")
			.os("linux", "6.1")
			.build())
	}

	/// Builds a reqwest client that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	pub fn test_http_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Constructs a [`SessionContext`] wired to an in-memory backend, a manual clock pinned at
	/// [`TEST_EPOCH`], a static browser context, and the [`test_http_client`].
	pub fn build_test_session(
		base_url: &str,
	) -> (SessionContext, Arc<MemoryBackend>, Arc<ManualClock>) {
		let backend = Arc::new(MemoryBackend::default());
		let clock = Arc::new(ManualClock::new(TEST_EPOCH));
		let session = SessionContext::builder(test_config(base_url))
			.backend(backend.clone())
			.clock(clock.clone())
			.context_source(Arc::new(test_context_source()))
			.http_client(test_http_client())
			.build()
			.expect("Failed to build test session context.");

		(session, backend, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
