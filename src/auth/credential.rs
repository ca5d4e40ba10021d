//! The access/refresh credential pair and the process-wide store holding it.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{self, SnapshotBackend, SnapshotWriter, StoreError},
};

/// Backend key the credential snapshot is written under.
pub const CREDENTIAL_STORE_KEY: &str = "steago.platform.store";

/// Access/refresh token pair authorizing outgoing requests.
///
/// Only the access token gates requests; the refresh token is carried for whoever renews the
/// session and is never checked here.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
	/// Bearer token attached to authenticated requests.
	pub access_token: Option<TokenSecret>,
	/// Token used upstream to renew the access token.
	pub refresh_token: Option<TokenSecret>,
}
impl Credential {
	/// Returns `true` if neither token is present.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none()
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Shared, mutable holder of the current [`Credential`].
///
/// Clones share one instance, so a token set through any clone is visible to every reader
/// right away. Every operation is total: when a snapshot backend is attached, write failures
/// are logged and the in-memory value stays authoritative.
#[derive(Clone, Default)]
pub struct CredentialStore {
	inner: Arc<RwLock<Credential>>,
	snapshots: Option<Arc<SnapshotWriter>>,
}
impl CredentialStore {
	/// Creates an empty, non-persistent store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store synced to `backend`, restoring the last snapshot when one exists.
	pub fn persistent(backend: Arc<dyn SnapshotBackend>) -> Result<Self, StoreError> {
		let restored = store::restore::<Credential>(backend.as_ref(), CREDENTIAL_STORE_KEY)?;

		Ok(Self {
			inner: Arc::new(RwLock::new(restored.unwrap_or_default())),
			snapshots: Some(Arc::new(SnapshotWriter::new(backend, CREDENTIAL_STORE_KEY))),
		})
	}

	/// Replaces the access token.
	pub fn set_access_token(&self, token: impl Into<TokenSecret>) {
		self.mutate(|credential| credential.access_token = Some(token.into()));
	}

	/// Replaces the refresh token.
	pub fn set_refresh_token(&self, token: impl Into<TokenSecret>) {
		self.mutate(|credential| credential.refresh_token = Some(token.into()));
	}

	/// Drops both tokens; used when the session ends.
	pub fn clear(&self) {
		self.mutate(|credential| *credential = Credential::default());
	}

	/// Current access token, if any.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.inner.read().access_token.clone()
	}

	/// Current refresh token, if any.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.inner.read().refresh_token.clone()
	}

	/// Copy of the whole credential pair.
	pub fn snapshot(&self) -> Credential {
		self.inner.read().clone()
	}

	fn mutate(&self, f: impl FnOnce(&mut Credential)) {
		let Some(snapshots) = &self.snapshots else {
			f(&mut self.inner.write());

			return;
		};
		let staged = {
			let mut guard = self.inner.write();

			f(&mut guard);
			snapshots.stage(guard.clone())
		};

		snapshots.commit(staged);
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore")
			.field("credential", &*self.inner.read())
			.field("persistent", &self.snapshots.is_some())
			.finish()
	}
}
