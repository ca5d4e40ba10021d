//! Built-in pre-send hooks.

// crates.io
use reqwest::{
	Request,
	header::{AUTHORIZATION, HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	auth::CredentialStore,
	context::ContextSource,
	error::ConfigError,
	http::PreSendHook,
	obs,
};

/// Stamps the `C-Browser-Context` diagnostic header.
///
/// The header is best effort: if the context cannot be collected or encoded, the request is
/// sent without it.
#[derive(Clone)]
pub struct BrowserContextHook {
	source: Arc<dyn ContextSource>,
}
impl BrowserContextHook {
	/// Reads the context from `source` on every request.
	pub fn new(source: Arc<dyn ContextSource>) -> Self {
		Self { source }
	}

	fn header_value(&self) -> Result<HeaderValue, Box<dyn StdError + Send + Sync>> {
		let context = self.source.browser_context()?;
		let encoded = context.to_header_value()?;

		// Page titles and URLs may carry non-ASCII text, which `from_str` would reject.
		Ok(HeaderValue::from_bytes(encoded.as_bytes())?)
	}
}
impl PreSendHook for BrowserContextHook {
	fn before_send(&self, request: &mut Request) -> Result<()> {
		match self.header_value() {
			Ok(value) => {
				request.headers_mut().insert(HeaderName::from_static("c-browser-context"), value);
			},
			Err(e) => obs::context_header_skipped(&e),
		}

		Ok(())
	}
}
impl Debug for BrowserContextHook {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BrowserContextHook(..)")
	}
}

/// Attaches `Authorization: Bearer <access token>`, read from the store at send time.
///
/// An empty access token counts as no token at all.
#[derive(Clone, Debug)]
pub struct BearerAuthHook {
	credentials: CredentialStore,
	workspace_id: Option<String>,
}
impl BearerAuthHook {
	/// Gates requests on the access token held by `credentials`.
	pub fn new(credentials: CredentialStore, workspace_id: Option<String>) -> Self {
		Self { credentials, workspace_id }
	}
}
impl PreSendHook for BearerAuthHook {
	fn before_send(&self, request: &mut Request) -> Result<()> {
		let Some(token) = self.credentials.access_token().filter(|t| !t.expose().is_empty())
		else {
			obs::credential_missing(self.workspace_id.as_deref());

			return Err(Error::MissingCredential { workspace_id: self.workspace_id.clone() });
		};
		let mut value =
			HeaderValue::from_str(&token.bearer()).map_err(ConfigError::request_build)?;

		value.set_sensitive(true);
		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(())
	}
}
