//! Environment-provided client configuration.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Variable holding the platform API base URL.
pub const BASE_URL_VAR: &str = "NEXUS_PLATFORM_API_BASE_URL";
/// Variable holding the display name of the application.
pub const APP_NAME_VAR: &str = "NEXUS_APP_NAME";
/// Variable holding the path of the application logo.
pub const APP_LOGO_VAR: &str = "NEXUS_APP_LOGO";

/// Settings consumed by the client factory.
///
/// Values are carried raw and only validated when a client is constructed, so a missing or
/// malformed base URL fails that construction attempt and nothing else.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Platform API base URL; required to build any client.
	pub base_url: Option<String>,
	/// Display name for presentation collaborators.
	pub app_name: Option<String>,
	/// Logo path for presentation collaborators.
	pub app_logo: Option<String>,
}
impl ClientConfig {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Reads the configuration through `lookup`; blank values count as unset.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let read = |key| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

		Self {
			base_url: read(BASE_URL_VAR),
			app_name: read(APP_NAME_VAR),
			app_logo: read(APP_LOGO_VAR),
		}
	}

	/// Parses the base URL, failing if it is missing or malformed.
	pub fn base_url(&self) -> Result<Url, ConfigError> {
		let raw = self
			.base_url
			.as_deref()
			.ok_or(ConfigError::MissingBaseUrl { variable: BASE_URL_VAR })?;

		Url::parse(raw)
			.map_err(|source| ConfigError::InvalidBaseUrl { value: raw.to_owned(), source })
	}
}
