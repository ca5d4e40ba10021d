//! Client factories: the seam between callers that need a client and the code that builds one.

// self
use crate::{
	_prelude::*,
	auth::CredentialStore,
	config::ClientConfig,
	context::{ContextSource, ProcessContextSource},
	http::{BearerAuthHook, BrowserContextHook, ClientHandle},
};

/// Caller-supplied constructor for plain clients.
pub type PlainClientFn = Arc<dyn Fn() -> Result<ClientHandle> + Send + Sync>;
/// Caller-supplied constructor for authenticated clients, keyed by workspace.
pub type AuthClientFn = Arc<dyn Fn(Option<&str>) -> Result<ClientHandle> + Send + Sync>;

/// Builds plain and authenticated client handles.
pub trait ClientFactory
where
	Self: Send + Sync,
{
	/// Builds a client that carries diagnostic headers only.
	fn create_plain_client(&self) -> Result<ClientHandle>;

	/// Builds a client that also carries the session's bearer token.
	///
	/// Implementations must read the credential when each request is sent, never here.
	fn create_auth_client(&self, workspace_id: Option<&str>) -> Result<ClientHandle>;
}

/// Built-in factory wired to the session's configuration and credential store.
#[derive(Clone)]
pub struct DefaultClientFactory {
	config: ClientConfig,
	credentials: CredentialStore,
	context: Arc<dyn ContextSource>,
	http: ReqwestClient,
}
impl DefaultClientFactory {
	/// Creates a factory sharing `http` across every handle it builds.
	///
	/// The diagnostic context comes from the running process until
	/// [`with_context_source`](Self::with_context_source) replaces it.
	pub fn new(config: ClientConfig, credentials: CredentialStore, http: ReqwestClient) -> Self {
		Self { config, credentials, context: Arc::new(ProcessContextSource::detect()), http }
	}

	/// Replaces the diagnostic context source.
	pub fn with_context_source(mut self, context: Arc<dyn ContextSource>) -> Self {
		self.context = context;

		self
	}

	/// Configuration the factory validates on every construction.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}
}
impl ClientFactory for DefaultClientFactory {
	fn create_plain_client(&self) -> Result<ClientHandle> {
		let base_url = self.config.base_url()?;

		Ok(ClientHandle::new(self.http.clone(), base_url)
			.with_hook(BrowserContextHook::new(self.context.clone())))
	}

	fn create_auth_client(&self, workspace_id: Option<&str>) -> Result<ClientHandle> {
		let workspace_id = workspace_id.map(ToOwned::to_owned);
		let auth = BearerAuthHook::new(self.credentials.clone(), workspace_id.clone());

		Ok(self.create_plain_client()?.with_hook(auth).into_authenticated(workspace_id))
	}
}
impl Debug for DefaultClientFactory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DefaultClientFactory")
			.field("config", &self.config)
			.field("credentials", &self.credentials)
			.finish()
	}
}

/// Factory assembled from two caller closures.
#[derive(Clone)]
pub struct FnClientFactory {
	plain: PlainClientFn,
	auth: AuthClientFn,
}
impl FnClientFactory {
	/// Pairs the two constructors.
	pub fn new(plain: PlainClientFn, auth: AuthClientFn) -> Self {
		Self { plain, auth }
	}
}
impl ClientFactory for FnClientFactory {
	fn create_plain_client(&self) -> Result<ClientHandle> {
		(self.plain)()
	}

	fn create_auth_client(&self, workspace_id: Option<&str>) -> Result<ClientHandle> {
		(self.auth)(workspace_id)
	}
}
impl Debug for FnClientFactory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnClientFactory(..)")
	}
}
