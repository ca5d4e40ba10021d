//! One-time installation point for the client factories.
//!
//! Many independent call sites ask for clients and none of them can coordinate who goes
//! first, so the gate makes the rule explicit: the first successful [`ClientGate::initialize`]
//! call installs its factories and every later call is a no-op, whatever options it carries.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	factory::{AuthClientFn, ClientFactory, DefaultClientFactory, FnClientFactory, PlainClientFn},
	http::ClientHandle,
};

/// Options accepted by [`ClientGate::initialize`].
#[derive(Clone, Default)]
pub struct InitOptions {
	/// Install the gate's built-in [`DefaultClientFactory`].
	pub use_defaults: bool,
	/// Constructor for plain clients; required together with `auth_client_factory` when
	/// `use_defaults` is off.
	pub plain_client_factory: Option<PlainClientFn>,
	/// Constructor for authenticated clients; required together with `plain_client_factory`
	/// when `use_defaults` is off.
	pub auth_client_factory: Option<AuthClientFn>,
}
impl InitOptions {
	/// Options selecting the built-in factory.
	pub fn defaults() -> Self {
		Self { use_defaults: true, ..Default::default() }
	}

	/// Options installing caller-supplied constructors.
	pub fn custom(
		plain: impl 'static + Send + Sync + Fn() -> Result<ClientHandle>,
		auth: impl 'static + Send + Sync + Fn(Option<&str>) -> Result<ClientHandle>,
	) -> Self {
		Self {
			use_defaults: false,
			plain_client_factory: Some(Arc::new(plain)),
			auth_client_factory: Some(Arc::new(auth)),
		}
	}
}
impl Debug for InitOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("InitOptions")
			.field("use_defaults", &self.use_defaults)
			.field("plain_client_factory", &self.plain_client_factory.is_some())
			.field("auth_client_factory", &self.auth_client_factory.is_some())
			.finish()
	}
}

/// What a call to [`ClientGate::initialize`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
	/// This call installed the factories.
	Installed,
	/// Factories were already installed; nothing changed.
	AlreadyInitialized,
}

/// Holds the installed [`ClientFactory`] once initialization happened.
pub struct ClientGate {
	defaults: DefaultClientFactory,
	installed: RwLock<Option<Arc<dyn ClientFactory>>>,
}
impl ClientGate {
	/// Creates an uninitialized gate that installs `defaults` when asked to.
	pub fn new(defaults: DefaultClientFactory) -> Self {
		Self { defaults, installed: RwLock::new(None) }
	}

	/// Installs factories according to `options` unless the gate is already initialized.
	///
	/// Validation only happens on the first successful call; once initialized, even unusable
	/// options are accepted as a no-op.
	pub fn initialize(&self, options: InitOptions) -> Result<InitOutcome> {
		let mut installed = self.installed.write();

		if installed.is_some() {
			return Ok(InitOutcome::AlreadyInitialized);
		}

		let use_defaults = options.use_defaults;
		let factory: Arc<dyn ClientFactory> = if use_defaults {
			Arc::new(self.defaults.clone())
		} else {
			match (options.plain_client_factory, options.auth_client_factory) {
				(Some(plain), Some(auth)) => Arc::new(FnClientFactory::new(plain, auth)),
				_ =>
					return Err(Error::InvalidConfiguration {
						reason: "both client factories are required unless defaults are used",
					}),
			}
		};

		*installed = Some(factory);
		crate::obs::clients_installed(if use_defaults { "defaults" } else { "custom" });

		Ok(InitOutcome::Installed)
	}

	/// Returns `true` once a call to [`initialize`](Self::initialize) succeeded.
	pub fn is_initialized(&self) -> bool {
		self.installed.read().is_some()
	}

	/// Installed factory, if any.
	pub fn factory(&self) -> Option<Arc<dyn ClientFactory>> {
		self.installed.read().clone()
	}

	/// Builds a plain client through the installed factory.
	pub fn create_plain_client(&self) -> Result<ClientHandle> {
		self.require()?.create_plain_client()
	}

	/// Builds an authenticated client through the installed factory.
	pub fn create_auth_client(&self, workspace_id: Option<&str>) -> Result<ClientHandle> {
		self.require()?.create_auth_client(workspace_id)
	}

	fn require(&self) -> Result<Arc<dyn ClientFactory>, ConfigError> {
		self.factory().ok_or(ConfigError::Uninitialized)
	}
}
impl Debug for ClientGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientGate").field("initialized", &self.is_initialized()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::CredentialStore, config::ClientConfig};

	fn gate() -> ClientGate {
		let config = ClientConfig {
			base_url: Some("https://defaults.example.com".into()),
			..Default::default()
		};
		let factory =
			DefaultClientFactory::new(config, CredentialStore::new(), ReqwestClient::new());

		ClientGate::new(factory)
	}

	fn fixed_client(base: &'static str) -> impl Fn() -> Result<ClientHandle> + Send + Sync {
		move || {
			Ok(ClientHandle::new(
				ReqwestClient::new(),
				Url::parse(base).expect("Custom base URL fixture should parse."),
			))
		}
	}

	#[test]
	fn uninitialized_gate_refuses_to_build() {
		let err = gate().create_plain_client().expect_err("Uninitialized gate has no factory.");

		assert!(matches!(err, Error::Config(ConfigError::Uninitialized)));
	}

	#[test]
	fn partial_custom_options_are_rejected() {
		let gate = gate();
		let options = InitOptions {
			plain_client_factory: Some(Arc::new(fixed_client("https://custom.example.com"))),
			..Default::default()
		};
		let err = gate.initialize(options).expect_err("Half-configured options must fail.");

		assert!(matches!(err, Error::InvalidConfiguration { .. }));
		assert!(!gate.is_initialized());
	}

	#[test]
	fn first_initialization_wins() {
		let gate = gate();
		let plain = fixed_client("https://custom.example.com");
		let outcome = gate
			.initialize(InitOptions::custom(plain, |_| Err(ConfigError::Uninitialized.into())))
			.expect("Custom options should install.");

		assert_eq!(outcome, InitOutcome::Installed);

		let outcome =
			gate.initialize(InitOptions::defaults()).expect("Re-initialization is a no-op.");

		assert_eq!(outcome, InitOutcome::AlreadyInitialized);

		let outcome = gate
			.initialize(InitOptions::default())
			.expect("Invalid options are ignored once initialized.");

		assert_eq!(outcome, InitOutcome::AlreadyInitialized);
		assert_eq!(
			gate.create_plain_client()
				.expect("Custom plain factory should still be installed.")
				.base_url()
				.as_str(),
			"https://custom.example.com/"
		);
	}

	#[test]
	fn defaults_install_builtin_factory() {
		let gate = gate();

		gate.initialize(InitOptions::defaults()).expect("Defaults should install.");

		let client =
			gate.create_auth_client(Some("ws")).expect("Default auth client should build.");

		assert_eq!(client.base_url().as_str(), "https://defaults.example.com/");
		assert_eq!(client.workspace_id(), Some("ws"));
	}
}
