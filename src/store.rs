//! Durable snapshot backends used to persist session state between process runs.
//!
//! Stateful components stay authoritative in memory; after each mutation they serialize a
//! [`Persisted`] envelope and hand it to a [`SnapshotBackend`] under a namespaced key. On
//! startup the same key is read back and, if its version matches, used as initial state.
//!
//! Envelopes are encoded while the owner still holds its state lock and written after it
//! releases that lock, so readers of the in-memory state never wait on backend I/O.

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Version stamped on every envelope written by this crate.
pub const SNAPSHOT_VERSION: u32 = 0;

/// Key/value contract implemented by snapshot backends.
pub trait SnapshotBackend
where
	Self: Send + Sync,
{
	/// Reads the raw payload stored under `key`, if any.
	fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Persists or replaces the payload stored under `key`.
	fn save(&self, key: &str, payload: String) -> Result<(), StoreError>;

	/// Deletes the payload stored under `key`; missing keys are not an error.
	fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`SnapshotBackend`] implementations and envelope decoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced while encoding or decoding a snapshot.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage medium.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Versioned wrapper around a persisted state shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persisted<T> {
	/// Persisted state.
	pub state: T,
	/// Layout version the state was written with.
	pub version: u32,
}
impl<T> Persisted<T>
where
	T: Serialize + for<'de> Deserialize<'de>,
{
	/// Wraps `state` with the current [`SNAPSHOT_VERSION`].
	pub fn current(state: T) -> Self {
		Self { state, version: SNAPSHOT_VERSION }
	}

	/// Encodes the envelope as JSON.
	pub fn encode(&self) -> Result<String, StoreError> {
		serde_json::to_string(self).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize snapshot: {e}"),
		})
	}

	/// Decodes an envelope, reporting the JSON path of the first failure.
	pub fn decode(payload: &str) -> Result<Self, StoreError> {
		let de = &mut serde_json::Deserializer::from_str(payload);

		serde_path_to_error::deserialize(de).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse snapshot at `{}`: {}", e.path(), e.inner()),
		})
	}
}

/// Loads the state stored under `key`, discarding envelopes written with another version.
pub fn restore<T>(backend: &dyn SnapshotBackend, key: &str) -> Result<Option<T>, StoreError>
where
	T: Serialize + for<'de> Deserialize<'de>,
{
	let Some(payload) = backend.load(key)? else {
		return Ok(None);
	};
	let envelope = Persisted::<T>::decode(&payload)?;

	if envelope.version != SNAPSHOT_VERSION {
		crate::obs::snapshot_discarded(key, envelope.version);

		return Ok(None);
	}

	Ok(Some(envelope.state))
}

/// Writes the snapshots of one key in the order their states were produced.
///
/// [`stage`](Self::stage) runs under the owner's state lock and numbers the envelope;
/// [`commit`](Self::commit) runs after that lock is released. A staged envelope older than
/// the last committed one is dropped, so a slow writer never overwrites newer state.
/// Failures are logged and swallowed.
pub(crate) struct SnapshotWriter {
	backend: Arc<dyn SnapshotBackend>,
	key: &'static str,
	staged: AtomicU64,
	committed: Mutex<u64>,
}
impl SnapshotWriter {
	pub(crate) fn new(backend: Arc<dyn SnapshotBackend>, key: &'static str) -> Self {
		Self { backend, key, staged: AtomicU64::new(0), committed: Mutex::new(0) }
	}

	pub(crate) fn stage<T>(&self, state: T) -> StagedSnapshot
	where
		T: Serialize + for<'de> Deserialize<'de>,
	{
		StagedSnapshot {
			generation: self.staged.fetch_add(1, Ordering::Relaxed) + 1,
			payload: Persisted::current(state).encode(),
		}
	}

	pub(crate) fn commit(&self, snapshot: StagedSnapshot) {
		let mut committed = self.committed.lock();

		if snapshot.generation <= *committed {
			return;
		}

		*committed = snapshot.generation;

		if let Err(e) = snapshot.payload.and_then(|payload| self.backend.save(self.key, payload)) {
			crate::obs::snapshot_write_failed(self.key, &e);
		}
	}
}

/// Encoded envelope waiting to be written by its [`SnapshotWriter`].
pub(crate) struct StagedSnapshot {
	generation: u64,
	payload: Result<String, StoreError>,
}
