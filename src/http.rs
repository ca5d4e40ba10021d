//! Outgoing-request client handles and the pre-send hook pipeline.
//!
//! A [`ClientHandle`] is a base URL, a shared [`ReqwestClient`], and an ordered list of
//! [`PreSendHook`]s. Hooks run immediately before each transmission, against the fully
//! built request, so anything they read (the credential store, the current page) is
//! observed at send time rather than when the handle was created. Handles keep no state
//! between requests and are cheap to clone.
//!
//! Requests are assembled through [`ClientRequest`], which never exposes the underlying
//! transport builder: the only way to transmit one is through the handle's hook pipeline.

pub mod hook;
pub mod url_path;

pub use hook::*;
pub use url_path::*;

// crates.io
use reqwest::{
	Body, Method, Request, RequestBuilder, Response,
	header::{HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	obs::{self, ClientSpan, RequestOutcome},
};

/// Whether a handle attaches the session credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientMode {
	/// Diagnostic headers only.
	Plain,
	/// Diagnostic headers plus `Authorization: Bearer <token>`.
	Authenticated,
}
impl ClientMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClientMode::Plain => "plain",
			ClientMode::Authenticated => "authenticated",
		}
	}
}
impl Display for ClientMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Function invoked right before a request leaves the process.
///
/// Hooks may read live state and mutate headers. Returning an error aborts the request
/// before anything is transmitted.
pub trait PreSendHook
where
	Self: Send + Sync,
{
	/// Inspects or amends `request`.
	fn before_send(&self, request: &mut Request) -> Result<()>;
}
impl<F> PreSendHook for F
where
	F: Send + Sync + Fn(&mut Request) -> Result<()>,
{
	fn before_send(&self, request: &mut Request) -> Result<()> {
		self(request)
	}
}

/// Configured, reusable outgoing-request client.
#[derive(Clone)]
pub struct ClientHandle {
	http: ReqwestClient,
	base_url: Url,
	mode: ClientMode,
	workspace_id: Option<String>,
	hooks: Vec<Arc<dyn PreSendHook>>,
}
impl ClientHandle {
	/// Creates a plain handle without hooks.
	pub fn new(http: ReqwestClient, base_url: Url) -> Self {
		Self { http, base_url, mode: ClientMode::Plain, workspace_id: None, hooks: Vec::new() }
	}

	/// Appends a hook, consuming the handle.
	pub fn with_hook(mut self, hook: impl 'static + PreSendHook) -> Self {
		self.hooks.push(Arc::new(hook));

		self
	}

	/// Returns a new handle that runs this handle's hooks followed by `hook`.
	pub fn extend(&self, hook: Arc<dyn PreSendHook>) -> Self {
		let mut extended = self.clone();

		extended.hooks.push(hook);

		extended
	}

	/// Marks the handle as authenticated for `workspace_id`.
	///
	/// This only labels the handle; the credential check itself is a hook.
	pub fn into_authenticated(mut self, workspace_id: Option<String>) -> Self {
		self.mode = ClientMode::Authenticated;
		self.workspace_id = workspace_id;

		self
	}

	/// Base URL every request path is resolved under.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Plain or authenticated.
	pub fn mode(&self) -> ClientMode {
		self.mode
	}

	/// Workspace the handle was created for.
	pub fn workspace_id(&self) -> Option<&str> {
		self.workspace_id.as_deref()
	}

	/// Number of installed hooks.
	pub fn hook_count(&self) -> usize {
		self.hooks.len()
	}

	/// Resolves `path` (optionally carrying a `?query`) under the base URL.
	pub fn endpoint(&self, path: &str) -> Url {
		let (path, query) = match path.split_once('?') {
			Some((path, query)) => (path, Some(query)),
			None => (path, None),
		};
		let mut url = self.base_url.clone();

		url.set_path(&join_url_paths([self.base_url.path(), path]));
		url.set_query(query);

		url
	}

	/// Starts a request for `path` under the base URL.
	pub fn request(&self, method: Method, path: &str) -> ClientRequest<'_> {
		ClientRequest { client: self, builder: self.http.request(method, self.endpoint(path)) }
	}

	/// Starts a `GET` request.
	pub fn get(&self, path: &str) -> ClientRequest<'_> {
		self.request(Method::GET, path)
	}

	/// Starts a `POST` request.
	pub fn post(&self, path: &str) -> ClientRequest<'_> {
		self.request(Method::POST, path)
	}

	/// Starts a `PUT` request.
	pub fn put(&self, path: &str) -> ClientRequest<'_> {
		self.request(Method::PUT, path)
	}

	/// Starts a `DELETE` request.
	pub fn delete(&self, path: &str) -> ClientRequest<'_> {
		self.request(Method::DELETE, path)
	}

	/// Runs every hook, in order, against `request`.
	pub fn prepare(&self, mut request: Request) -> Result<Request> {
		for hook in &self.hooks {
			hook.before_send(&mut request)?;
		}

		Ok(request)
	}

	/// Applies the hooks, then transmits `request`.
	///
	/// Non-success statuses are returned as-is; only hook refusals and transport failures
	/// surface as errors.
	pub async fn execute(&self, request: Request) -> Result<Response> {
		let span = ClientSpan::new(self.mode, self.workspace_id.as_deref());

		span.instrument(self.execute_inner(request)).await
	}

	async fn execute_inner(&self, request: Request) -> Result<Response> {
		obs::record_request_outcome(self.mode, RequestOutcome::Attempt);

		let request = match self.prepare(request) {
			Ok(request) => request,
			Err(e) => {
				obs::record_request_outcome(self.mode, RequestOutcome::Blocked);

				return Err(e);
			},
		};

		match self.http.execute(request).await {
			Ok(response) => {
				obs::record_request_outcome(self.mode, RequestOutcome::Sent);

				Ok(response)
			},
			Err(e) => {
				obs::record_request_outcome(self.mode, RequestOutcome::Failure);

				Err(TransportError::from(e).into())
			},
		}
	}
}
impl Debug for ClientHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientHandle")
			.field("base_url", &self.base_url.as_str())
			.field("mode", &self.mode)
			.field("workspace_id", &self.workspace_id)
			.field("hooks", &self.hooks.len())
			.finish()
	}
}

/// Request being assembled for a [`ClientHandle`].
///
/// [`send`](Self::send) is the only way out, and it always runs the handle's hooks first.
#[must_use = "a request does nothing until it is sent"]
pub struct ClientRequest<'a> {
	client: &'a ClientHandle,
	builder: RequestBuilder,
}
impl ClientRequest<'_> {
	/// Adds a header; values already set under the same name are kept.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.builder = self.builder.header(name, value);

		self
	}

	/// Appends URL-encoded query parameters.
	pub fn query<T>(mut self, query: &T) -> Self
	where
		T: ?Sized + Serialize,
	{
		self.builder = self.builder.query(query);

		self
	}

	/// Sets the request body.
	pub fn body(mut self, body: impl Into<Body>) -> Self {
		self.builder = self.builder.body(body);

		self
	}

	/// Serializes `value` as the JSON body and sets `Content-Type: application/json`.
	pub fn json<T>(self, value: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(value).map_err(ConfigError::request_build)?;

		Ok(self
			.header(reqwest::header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
			.body(body))
	}

	/// Overrides the total timeout for this request.
	pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
		self.builder = self.builder.timeout(timeout);

		self
	}

	/// Builds the request and sends it through [`ClientHandle::execute`].
	pub async fn send(self) -> Result<Response> {
		let request = self.builder.build().map_err(ConfigError::request_build)?;

		self.client.execute(request).await
	}
}
impl Debug for ClientRequest<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientRequest").field("client", self.client).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn handle(base: &str) -> ClientHandle {
		ClientHandle::new(
			ReqwestClient::new(),
			Url::parse(base).expect("Base URL fixture should parse."),
		)
	}

	#[test]
	fn endpoint_uses_prefix_semantics() {
		let client = handle("https://api.example.com/v1/");

		assert_eq!(client.endpoint("/threads/").as_str(), "https://api.example.com/v1/threads");
		assert_eq!(
			client.endpoint("threads/abc?limit=5").as_str(),
			"https://api.example.com/v1/threads/abc?limit=5"
		);
		assert_eq!(
			handle("https://api.example.com").endpoint("health").as_str(),
			"https://api.example.com/health"
		);
	}

	#[test]
	fn hooks_run_in_order_and_extend_leaves_original_untouched() {
		let base =
			handle("https://api.example.com").with_hook(|request: &mut Request| -> Result<()> {
				request.headers_mut().insert("x-order", HeaderValue::from_static("first"));

				Ok(())
			});
		let extended = base.extend(Arc::new(|request: &mut Request| -> Result<()> {
			let previous = request.headers().get("x-order").cloned();

			assert_eq!(previous, Some(HeaderValue::from_static("first")));
			request.headers_mut().insert("x-order", HeaderValue::from_static("second"));

			Ok(())
		}));

		assert_eq!(base.hook_count(), 1);
		assert_eq!(extended.hook_count(), 2);

		let request = Request::new(Method::GET, extended.endpoint("ping"));
		let prepared = extended.prepare(request).expect("Hooks should accept the request.");

		assert_eq!(prepared.headers().get("x-order"), Some(&HeaderValue::from_static("second")));
	}

	#[test]
	fn failing_hook_blocks_request() {
		let client = handle("https://api.example.com")
			.with_hook(|_: &mut Request| -> Result<()> {
				Err(Error::MissingCredential { workspace_id: None })
			});
		let request = Request::new(Method::GET, client.endpoint("ping"));
		let err = client.prepare(request).expect_err("Hook error should abort the request.");

		assert!(matches!(err, Error::MissingCredential { .. }));
	}

	#[tokio::test]
	async fn sending_a_request_always_runs_the_hooks() {
		let client = handle("https://api.invalid")
			.with_hook(|_: &mut Request| -> Result<()> {
				Err(Error::MissingCredential { workspace_id: Some("ws-7".into()) })
			})
			.into_authenticated(Some("ws-7".into()));
		let err = client
			.get("v1/me")
			.query(&[("limit", "5")])
			.send()
			.await
			.expect_err("A refusing hook must stop the request before the network.");

		assert!(matches!(
			err,
			Error::MissingCredential { workspace_id: Some(ref id) } if id == "ws-7"
		));
	}
}
