//! The session composition root.
//!
//! [`SessionContext`] is built once at startup and shared (usually behind an [`Arc`]) with
//! everything that needs a client, the credential, or the new-thread registry. It replaces
//! module-level singletons: there is exactly one instance because the application only
//! builds one, not because it is global.

// crates.io
use tokio::task::JoinHandle;
// self
use crate::{
	_prelude::*,
	auth::{CredentialStore, WorkspaceSession},
	clock::{Clock, SystemClock},
	config::ClientConfig,
	context::ContextSource,
	error::{ConfigError, TransportError},
	factory::DefaultClientFactory,
	gate::{ClientGate, InitOptions, InitOutcome},
	http::ClientHandle,
	registry::EphemeralRegistry,
	store::SnapshotBackend,
};

/// Platform API path that trades a signed-in user for an access token.
pub const TOKEN_EXCHANGE_PATH: &str = "platform/auth/token";

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
	email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenExchangeResponse {
	access_token: String,
}

/// Everything a signed-in client session needs, owned in one place.
#[derive(Debug)]
pub struct SessionContext {
	/// Access/refresh credential shared with every authenticated client.
	pub credentials: CredentialStore,
	/// Workspace the user is currently acting in.
	pub workspace: WorkspaceSession,
	/// Freshly created chat threads awaiting acknowledgement.
	pub new_threads: EphemeralRegistry,
	/// Installation point for the client factories.
	pub clients: ClientGate,
	config: ClientConfig,
}
impl SessionContext {
	/// Returns a builder for a session using `config`.
	pub fn builder(config: ClientConfig) -> SessionContextBuilder {
		SessionContextBuilder::new(config)
	}

	/// Configuration the session was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Installs the client factories; see [`ClientGate::initialize`].
	pub fn initialize_clients(&self, options: InitOptions) -> Result<InitOutcome> {
		self.clients.initialize(options)
	}

	/// Builds a plain client through the installed factory.
	pub fn plain_client(&self) -> Result<ClientHandle> {
		self.clients.create_plain_client()
	}

	/// Builds an authenticated client for the current workspace.
	pub fn auth_client(&self) -> Result<ClientHandle> {
		self.clients.create_auth_client(self.workspace.current().as_deref())
	}

	/// Ends the session: drops the credential and forgets the current workspace.
	pub fn end_session(&self) {
		self.credentials.clear();
		self.workspace.clear();
	}

	/// Spawns a task that sweeps [`new_threads`](Self::new_threads) every `interval`.
	///
	/// The first sweep happens immediately. The task runs until the returned handle is
	/// aborted or the runtime shuts down. Must be called from within a Tokio runtime.
	///
	/// A zero `interval` is rejected with [`Error::InvalidConfiguration`].
	pub fn spawn_stale_sweeper(
		&self,
		interval: std::time::Duration,
		max_age: Duration,
	) -> Result<JoinHandle<()>> {
		if interval.is_zero() {
			return Err(Error::InvalidConfiguration {
				reason: "stale sweep interval must be greater than zero",
			});
		}

		let registry = self.new_threads.clone();

		Ok(tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);

			loop {
				ticker.tick().await;

				let registry = registry.clone();

				// Snapshot writes may touch the disk.
				if tokio::task::spawn_blocking(move || registry.sweep(max_age)).await.is_err() {
					break;
				}
			}
		}))
	}

	/// Exchanges the signed-in user's email for a platform access token and stores it.
	///
	/// The request goes through the plain client, so the gate must be initialized.
	pub async fn exchange_token(&self, email: &str) -> Result<()> {
		let client = self.plain_client()?;
		let response =
			client.post(TOKEN_EXCHANGE_PATH).json(&TokenExchangeRequest { email })?.send().await?;
		let status = response.status();

		if !status.is_success() {
			return Err(TransportError::Status { status: status.as_u16() }.into());
		}

		let bytes = response.bytes().await.map_err(TransportError::from)?;
		let de = &mut serde_json::Deserializer::from_slice(&bytes);
		let payload: TokenExchangeResponse = serde_path_to_error::deserialize(de)
			.map_err(|source| TransportError::Decode { source })?;

		self.credentials.set_access_token(payload.access_token);

		Ok(())
	}
}

/// Builder for [`SessionContext`].
pub struct SessionContextBuilder {
	config: ClientConfig,
	backend: Option<Arc<dyn SnapshotBackend>>,
	context_source: Option<Arc<dyn ContextSource>>,
	clock: Arc<dyn Clock>,
	http: Option<ReqwestClient>,
	request_timeout: Option<std::time::Duration>,
}
impl SessionContextBuilder {
	fn new(config: ClientConfig) -> Self {
		Self {
			config,
			backend: None,
			context_source: None,
			clock: Arc::new(SystemClock),
			http: None,
			request_timeout: None,
		}
	}

	/// Persists the credential and registry through `backend`.
	pub fn backend(mut self, backend: Arc<dyn SnapshotBackend>) -> Self {
		self.backend = Some(backend);

		self
	}

	/// Overrides where the diagnostic browser context comes from.
	pub fn context_source(mut self, source: Arc<dyn ContextSource>) -> Self {
		self.context_source = Some(source);

		self
	}

	/// Overrides the clock driving the registry.
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides the HTTP client shared by the built-in factory.
	pub fn http_client(mut self, http: ReqwestClient) -> Self {
		self.http = Some(http);

		self
	}

	/// Builds the shared HTTP client with a total per-request timeout.
	///
	/// Ignored when an explicit client is supplied through [`http_client`](Self::http_client).
	pub fn request_timeout(mut self, timeout: std::time::Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Restores persisted state (when a backend is set) and assembles the session.
	pub fn build(self) -> Result<SessionContext> {
		let (credentials, new_threads) = match &self.backend {
			Some(backend) => (
				CredentialStore::persistent(backend.clone())?,
				EphemeralRegistry::persistent(self.clock.clone(), backend.clone())?,
			),
			None => (CredentialStore::new(), EphemeralRegistry::new(self.clock.clone())),
		};
		let http = match self.http {
			Some(http) => http,
			None => {
				let mut builder = ReqwestClient::builder();

				if let Some(timeout) = self.request_timeout {
					builder = builder.timeout(timeout);
				}

				builder.build().map_err(ConfigError::http_client_build)?
			},
		};
		let mut defaults =
			DefaultClientFactory::new(self.config.clone(), credentials.clone(), http);

		if let Some(source) = self.context_source {
			defaults = defaults.with_context_source(source);
		}

		Ok(SessionContext {
			credentials,
			workspace: WorkspaceSession::default(),
			new_threads,
			clients: ClientGate::new(defaults),
			config: self.config,
		})
	}
}
impl Debug for SessionContextBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionContextBuilder")
			.field("config", &self.config)
			.field("persistent", &self.backend.is_some())
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}
