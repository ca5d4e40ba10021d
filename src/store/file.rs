//! File-backed [`SnapshotBackend`] keeping every key in one JSON document.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{SnapshotBackend, StoreError},
};

/// Persists snapshots to a JSON file after each write.
///
/// The file holds a single object mapping keys to their raw payloads. Writes go through a
/// sibling `.tmp` file followed by a rename so a crash never leaves a torn document behind.
#[derive(Clone, Debug)]
pub struct FileBackend {
	path: PathBuf,
	inner: Arc<RwLock<BTreeMap<String, String>>>,
}
impl FileBackend {
	/// Opens (or creates) a backend at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_document(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing document.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_document(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
		if !path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(BTreeMap::new());
		}

		let de = &mut serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(de).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &BTreeMap<String, String>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize snapshot document: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SnapshotBackend for FileBackend {
	fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.inner.read().get(key).cloned())
	}

	fn save(&self, key: &str, payload: String) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		guard.insert(key.to_owned(), payload);
		self.persist_locked(&guard)
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		if guard.remove(key).is_some() {
			self.persist_locked(&guard)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		let unique = format!(
			"nexus_session_file_backend_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("reload");
		let backend = FileBackend::open(&path).expect("Failed to open file backend.");

		backend
			.save("steago.platform.store", "{\"state\":{},\"version\":0}".into())
			.expect("Failed to save payload to file backend.");
		drop(backend);

		let reopened = FileBackend::open(&path).expect("Failed to reopen file backend.");
		let payload = reopened
			.load("steago.platform.store")
			.expect("Failed to load payload from file backend.")
			.expect("File backend lost payload after reopen.");

		assert_eq!(payload, "{\"state\":{},\"version\":0}");

		reopened.remove("steago.platform.store").expect("Failed to remove payload.");

		assert!(FileBackend::open(&path)
			.expect("Failed to reopen file backend after removal.")
			.load("steago.platform.store")
			.expect("Load after removal should succeed.")
			.is_none());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary snapshot document {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_document_is_reported() {
		let path = temp_path("corrupt");

		fs::write(&path, b"[1, 2").expect("Failed to write corrupt fixture.");

		let err = FileBackend::open(&path).expect_err("Corrupt document should fail to open.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary snapshot document {}: {e}", path.display())
		});
	}
}
