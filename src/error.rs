//! Crate-level error types shared by the credential store, client factory, and gate.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Snapshot persistence failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem raised while constructing a client.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, unexpected status, undecodable body).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// An authenticated request was about to be sent without an access token.
	///
	/// Callers are expected to route the user back to sign-in; nothing here refreshes the
	/// credential on their behalf.
	#[error("No access token is available for the authenticated request.")]
	MissingCredential {
		/// Workspace the authenticated client was created for, if any.
		workspace_id: Option<String>,
	},
	/// The client gate was initialized without a usable factory configuration.
	#[error("Client initialization is invalid: {reason}.")]
	InvalidConfiguration {
		/// Which part of the options was unusable.
		reason: &'static str,
	},
}
impl Error {
	/// Returns `true` if the failure means the session must be re-established by signing in.
	pub fn requires_sign_in(&self) -> bool {
		matches!(self, Self::MissingCredential { .. })
			|| matches!(self, Self::Transport(TransportError::Status { status: 401 }))
	}
}

/// Configuration failures raised at client-construction time.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base endpoint is not configured.
	#[error("Platform API base URL is not configured (set `{variable}`).")]
	MissingBaseUrl {
		/// Environment variable that was expected to carry the URL.
		variable: &'static str,
	},
	/// Base endpoint is configured but cannot be parsed.
	#[error("Platform API base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Clients were requested before the gate was initialized.
	#[error("Clients have not been initialized.")]
	Uninitialized,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Outgoing request could not be assembled (bad header bytes, invalid builder state).
	#[error("Request could not be built.")]
	RequestBuild {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a request assembly failure inside [`ConfigError`].
	pub fn request_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::RequestBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, status, decoding).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the platform API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Platform API answered with a non-success status.
	#[error("Platform API responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Platform API responded with a body that could not be decoded.
	#[error("Platform API returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_credential_requires_sign_in() {
		let err = Error::MissingCredential { workspace_id: Some("ws-1".into()) };

		assert!(err.requires_sign_in());
		assert!(Error::from(TransportError::Status { status: 401 }).requires_sign_in());
		assert!(!Error::from(TransportError::Status { status: 500 }).requires_sign_in());
		assert!(!Error::from(ConfigError::Uninitialized).requires_sign_in());
	}

	#[test]
	fn missing_base_url_names_the_variable() {
		let variable = crate::config::BASE_URL_VAR;
		let err = Error::from(ConfigError::MissingBaseUrl { variable });

		assert!(err.to_string().contains(variable));
	}
}
