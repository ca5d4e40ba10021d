//! Thread-safe in-memory [`SnapshotBackend`] for tests and processes without durable storage.

// self
use crate::{
	_prelude::*,
	store::{SnapshotBackend, StoreError},
};

/// Backend that keeps snapshots in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend(Arc<RwLock<HashMap<String, String>>>);
impl MemoryBackend {
	/// Returns the raw payload stored under `key`, bypassing the [`SnapshotBackend`] contract.
	pub fn raw(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	/// Number of keys currently held.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no snapshot has been written.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl SnapshotBackend for MemoryBackend {
	fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.raw(key))
	}

	fn save(&self, key: &str, payload: String) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), payload);

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.0.write().remove(key);

		Ok(())
	}
}
