//! In-memory tracking of the workspace the user is currently acting in.

// self
use crate::_prelude::*;

/// Current workspace identifier, shared across clones and never persisted.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceSession(Arc<RwLock<Option<String>>>);
impl WorkspaceSession {
	/// Switches to `workspace_id`; `None` or an empty id leaves the current workspace untouched.
	pub fn set_current(&self, workspace_id: Option<impl Into<String>>) {
		if let Some(id) = workspace_id.map(Into::into).filter(|id: &String| !id.is_empty()) {
			*self.0.write() = Some(id);
		}
	}

	/// Identifier of the current workspace.
	pub fn current(&self) -> Option<String> {
		self.0.read().clone()
	}

	/// Forgets the current workspace.
	pub fn clear(&self) {
		*self.0.write() = None;
	}
}
