//! Diagnostic browser context stamped onto outgoing requests.
//!
//! The payload is purely observational: the platform API uses it for analytics, and a request
//! must go out even when the context cannot be produced. Every field that depends on a live
//! page is optional and serializes as `null` when unknown; `locale` falls back to
//! [`DEFAULT_LOCALE`] and the OS fields fall back to [`UNKNOWN`].

// std
use std::env;
// self
use crate::_prelude::*;

/// Header carrying the JSON-encoded [`BrowserContext`].
pub const BROWSER_CONTEXT_HEADER: &str = "C-Browser-Context";
/// Locale reported when no preferred language is known.
pub const DEFAULT_LOCALE: &str = "en";
/// Placeholder for OS facts that could not be determined.
pub const UNKNOWN: &str = "unknown";

/// Failure to produce a [`BrowserContext`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ContextError {
	/// The source has nothing to report for the current environment.
	#[error("Browser context is unavailable: {reason}.")]
	Unavailable {
		/// Why the context could not be collected.
		reason: String,
	},
}

/// Page the user is looking at when the request is issued.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
	/// Path component of the page URL.
	pub path: Option<String>,
	/// Referring document.
	pub referrer: Option<String>,
	/// Query string, including the leading `?`.
	pub search: Option<String>,
	/// Document title.
	pub title: Option<String>,
	/// Full page URL.
	pub url: Option<String>,
}

/// Operating system facts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsContext {
	/// OS family name.
	pub name: String,
	/// OS version.
	pub version: String,
}
impl Default for OsContext {
	fn default() -> Self {
		Self { name: UNKNOWN.into(), version: UNKNOWN.into() }
	}
}

/// Payload of the [`BROWSER_CONTEXT_HEADER`] header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserContext {
	/// Current page.
	pub page: PageContext,
	/// User agent string.
	pub user_agent: Option<String>,
	/// Preferred locale tag.
	pub locale: String,
	/// Operating system facts.
	pub os: OsContext,
}
impl BrowserContext {
	/// Returns a builder seeded with the documented fallbacks.
	pub fn builder() -> BrowserContextBuilder {
		BrowserContextBuilder(Self::default())
	}

	/// Encodes the context as the header's JSON string.
	pub fn to_header_value(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}
impl Default for BrowserContext {
	fn default() -> Self {
		Self {
			page: PageContext::default(),
			user_agent: None,
			locale: DEFAULT_LOCALE.into(),
			os: OsContext::default(),
		}
	}
}

/// Builder for [`BrowserContext`].
#[derive(Clone, Debug)]
pub struct BrowserContextBuilder(BrowserContext);
impl BrowserContextBuilder {
	/// Sets the page path.
	pub fn page_path(mut self, path: impl Into<String>) -> Self {
		self.0.page.path = Some(path.into());

		self
	}

	/// Sets the full page URL.
	pub fn page_url(mut self, url: impl Into<String>) -> Self {
		self.0.page.url = Some(url.into());

		self
	}

	/// Replaces the whole page context.
	pub fn page(mut self, page: PageContext) -> Self {
		self.0.page = page;

		self
	}

	/// Sets the user agent.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.0.user_agent = Some(user_agent.into());

		self
	}

	/// Sets the locale tag.
	pub fn locale(mut self, locale: impl Into<String>) -> Self {
		self.0.locale = locale.into();

		self
	}

	/// Sets the OS name and version.
	pub fn os(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
		self.0.os = OsContext { name: name.into(), version: version.into() };

		self
	}

	/// Finishes the builder.
	pub fn build(self) -> BrowserContext {
		self.0
	}
}

/// Produces the context for a request at send time.
pub trait ContextSource
where
	Self: Send + Sync,
{
	/// Collects the current context.
	fn browser_context(&self) -> Result<BrowserContext, ContextError>;
}

/// Source that always reports the same context.
#[derive(Clone, Debug)]
pub struct StaticContextSource(BrowserContext);
impl StaticContextSource {
	/// Wraps a fixed context.
	pub fn new(context: BrowserContext) -> Self {
		Self(context)
	}
}
impl ContextSource for StaticContextSource {
	fn browser_context(&self) -> Result<BrowserContext, ContextError> {
		Ok(self.0.clone())
	}
}

/// Source backed by process facts plus a page slot the presentation layer keeps current.
#[derive(Debug)]
pub struct ProcessContextSource {
	page: RwLock<PageContext>,
	user_agent: String,
	locale: String,
	os: OsContext,
}
impl ProcessContextSource {
	/// Collects locale and OS facts from the running process.
	pub fn detect() -> Self {
		let languages = ["LC_ALL", "LC_MESSAGES", "LANG"]
			.into_iter()
			.filter_map(|var| env::var(var).ok())
			.collect::<Vec<_>>();

		Self::with_languages(languages.as_slice())
	}

	/// Builds a source from an explicit preferred-language list.
	pub fn with_languages<S>(languages: &[S]) -> Self
	where
		S: AsRef<str>,
	{
		Self {
			page: RwLock::new(PageContext::default()),
			user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
			locale: preferred_locale(languages),
			os: OsContext { name: env::consts::OS.into(), version: UNKNOWN.into() },
		}
	}

	/// Overrides the reported user agent.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Records the page the user navigated to.
	pub fn set_page(&self, page: PageContext) {
		*self.page.write() = page;
	}
}
impl ContextSource for ProcessContextSource {
	fn browser_context(&self) -> Result<BrowserContext, ContextError> {
		Ok(BrowserContext {
			page: self.page.read().clone(),
			user_agent: Some(self.user_agent.clone()),
			locale: self.locale.clone(),
			os: self.os.clone(),
		})
	}
}

/// Picks the first usable entry of a preferred-language list.
///
/// POSIX locale names are turned into language tags (`en_US.UTF-8` becomes `en-US`); the
/// `C`/`POSIX` pseudo-locales and blank entries are skipped. Falls back to
/// [`DEFAULT_LOCALE`].
pub fn preferred_locale<S>(languages: &[S]) -> String
where
	S: AsRef<str>,
{
	languages
		.iter()
		.find_map(|raw| {
			let base = raw.as_ref().split(['.', '@']).next().unwrap_or_default().trim();

			match base {
				"" | "C" | "POSIX" => None,
				tag => Some(tag.replace('_', "-")),
			}
		})
		.unwrap_or_else(|| DEFAULT_LOCALE.into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn header_schema_matches_platform_contract() {
		let context = BrowserContext::builder()
			.page_path("/chat")
			.user_agent("ua")
			.locale("de-DE")
			.os("linux", "6.1")
			.build();
		let value: serde_json::Value = serde_json::from_str(
			&context.to_header_value().expect("Browser context should serialize."),
		)
		.expect("Header value should be valid JSON.");

		assert_eq!(
			value,
			serde_json::json!({
				"page": {
					"path": "/chat",
					"referrer": null,
					"search": null,
					"title": null,
					"url": null
				},
				"userAgent": "ua",
				"locale": "de-DE",
				"os": { "name": "linux", "version": "6.1" }
			})
		);
	}

	#[test]
	fn defaults_fill_locale_and_os() {
		let context = BrowserContext::default();

		assert_eq!(context.locale, "en");
		assert_eq!(context.os.name, "unknown");
		assert_eq!(context.os.version, "unknown");
		assert!(context.user_agent.is_none());
	}

	#[test]
	fn preferred_locale_normalizes_posix_names() {
		assert_eq!(preferred_locale(&["", "C", "fr_CA.UTF-8", "en_US"]), "fr-CA");
		assert_eq!(preferred_locale(&["pt-BR"]), "pt-BR");
		assert_eq!(preferred_locale::<&str>(&[]), "en");
		assert_eq!(preferred_locale(&["POSIX"]), "en");
	}

	#[test]
	fn process_source_reports_latest_page() {
		let source = ProcessContextSource::with_languages(&["nl_NL.UTF-8"]).with_user_agent("ua/1");

		source.set_page(PageContext { path: Some("/settings".into()), ..Default::default() });

		let context = source.browser_context().expect("Process source should always succeed.");

		assert_eq!(context.page.path.as_deref(), Some("/settings"));
		assert_eq!(context.locale, "nl-NL");
		assert_eq!(context.user_agent.as_deref(), Some("ua/1"));
		assert_eq!(context.os.name, env::consts::OS);
	}
}
