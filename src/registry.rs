//! Time-indexed set of short-lived keys with age-based eviction.
//!
//! The registry tracks handles that only matter for a short while after they are created,
//! such as freshly opened chat threads that the server has not acknowledged yet. Owners
//! remove their entries explicitly; a periodic [`EphemeralRegistry::sweep`] catches the ones
//! nobody came back for. Sweeping is best-effort housekeeping: nothing relies on an entry
//! being gone.

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	store::{self, SnapshotBackend, SnapshotWriter, StagedSnapshot, StoreError},
};

/// Backend key the registry snapshot is written under.
pub const REGISTRY_STORE_KEY: &str = "steago.platform.new_threads";

/// Persisted shape of a single entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
	/// Creation instant, stored as Unix milliseconds.
	#[serde(with = "time::serde::timestamp::milliseconds")]
	pub created_at: OffsetDateTime,
}

type EntryMap = BTreeMap<String, RegistryEntry>;

/// Shared registry of keys and the instant they were (last) inserted.
#[derive(Clone)]
pub struct EphemeralRegistry {
	entries: Arc<RwLock<EntryMap>>,
	clock: Arc<dyn Clock>,
	snapshots: Option<Arc<SnapshotWriter>>,
}
impl EphemeralRegistry {
	/// Creates an empty, non-persistent registry driven by `clock`.
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self { entries: Default::default(), clock, snapshots: None }
	}

	/// Creates a registry synced to `backend`, restoring the last snapshot when one exists.
	pub fn persistent(
		clock: Arc<dyn Clock>,
		backend: Arc<dyn SnapshotBackend>,
	) -> Result<Self, StoreError> {
		let restored = store::restore::<EntryMap>(backend.as_ref(), REGISTRY_STORE_KEY)?;

		Ok(Self {
			entries: Arc::new(RwLock::new(restored.unwrap_or_default())),
			clock,
			snapshots: Some(Arc::new(SnapshotWriter::new(backend, REGISTRY_STORE_KEY))),
		})
	}

	/// Records `key` as created now, overwriting the timestamp of an existing entry.
	pub fn insert(&self, key: impl Into<String>) {
		let created_at = self.clock.now();
		let staged = {
			let mut guard = self.entries.write();

			guard.insert(key.into(), RegistryEntry { created_at });
			self.stage(&guard)
		};

		self.commit(staged);
	}

	/// Removes `key`; missing keys are ignored.
	pub fn remove(&self, key: &str) {
		let staged = {
			let mut guard = self.entries.write();

			if guard.remove(key).is_none() {
				return;
			}

			self.stage(&guard)
		};

		self.commit(staged);
	}

	/// Removes every entry older than `max_age` and returns the evicted keys in key order.
	///
	/// An entry is stale when `now - created_at > max_age`, so an entry exactly `max_age` old
	/// survives. The whole pass runs under one write lock: every entry is inspected exactly
	/// once against a single `now`, which makes back-to-back sweeps idempotent. The snapshot
	/// is written after the lock is released.
	pub fn sweep(&self, max_age: Duration) -> Vec<String> {
		let now = self.clock.now();
		let mut evicted = Vec::new();
		let staged = {
			let mut guard = self.entries.write();

			guard.retain(|key, entry| {
				let age = now - entry.created_at;

				if age > max_age {
					crate::obs::entry_evicted(key, age);
					evicted.push(key.clone());

					false
				} else {
					true
				}
			});

			if evicted.is_empty() {
				return evicted;
			}

			self.stage(&guard)
		};

		self.commit(staged);
		crate::obs::record_evictions(evicted.len());

		evicted
	}

	/// Convenience wrapper around [`sweep`](Self::sweep) taking whole seconds.
	pub fn sweep_secs(&self, max_age_secs: u32) -> Vec<String> {
		self.sweep(Duration::seconds(max_age_secs.into()))
	}

	/// Returns `true` if `key` is registered.
	pub fn contains(&self, key: &str) -> bool {
		self.entries.read().contains_key(key)
	}

	/// Creation instant of `key`, if registered.
	pub fn created_at(&self, key: &str) -> Option<OffsetDateTime> {
		self.entries.read().get(key).map(|entry| entry.created_at)
	}

	/// Registered keys in key order.
	pub fn keys(&self) -> Vec<String> {
		self.entries.read().keys().cloned().collect()
	}

	/// Number of registered keys.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	fn stage(&self, entries: &EntryMap) -> Option<StagedSnapshot> {
		self.snapshots.as_ref().map(|snapshots| snapshots.stage(entries.clone()))
	}

	fn commit(&self, staged: Option<StagedSnapshot>) {
		if let (Some(snapshots), Some(staged)) = (&self.snapshots, staged) {
			snapshots.commit(staged);
		}
	}
}
impl Default for EphemeralRegistry {
	fn default() -> Self {
		Self::new(Arc::new(SystemClock))
	}
}
impl Debug for EphemeralRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EphemeralRegistry")
			.field("entries", &*self.entries.read())
			.field("persistent", &self.snapshots.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{clock::ManualClock, store::MemoryBackend};

	const T0: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

	fn registry() -> (EphemeralRegistry, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(T0));

		(EphemeralRegistry::new(clock.clone()), clock)
	}

	#[test]
	fn sweep_keeps_entries_within_threshold() {
		let (registry, clock) = registry();

		registry.insert("t1");
		clock.set(T0 + Duration::milliseconds(1000));
		registry.insert("t2");
		clock.set(T0 + Duration::milliseconds(2500));

		// Ages are 2500ms and 1500ms against a 1000ms threshold.
		assert_eq!(registry.sweep_secs(1), vec!["t1".to_owned(), "t2".to_owned()]);
		assert!(registry.is_empty());
	}

	#[test]
	fn entry_exactly_at_threshold_survives() {
		let (registry, clock) = registry();

		registry.insert("edge");
		clock.advance(Duration::seconds(5));

		assert!(registry.sweep_secs(5).is_empty());

		clock.advance(Duration::milliseconds(1));

		assert_eq!(registry.sweep_secs(5), vec!["edge".to_owned()]);
	}

	#[test]
	fn insert_touches_existing_entry() {
		let (registry, clock) = registry();

		registry.insert("t1");
		clock.advance(Duration::seconds(10));
		registry.insert("t1");

		assert_eq!(registry.created_at("t1"), Some(T0 + Duration::seconds(10)));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn remove_missing_key_is_noop() {
		let (registry, _clock) = registry();

		registry.remove("never-inserted");
		registry.insert("t1");
		registry.remove("t1");
		registry.remove("t1");

		assert!(registry.is_empty());
	}

	#[test]
	fn persisted_entries_use_unix_millis() {
		let clock = Arc::new(ManualClock::new(T0));
		let backend = Arc::new(MemoryBackend::default());
		let registry = EphemeralRegistry::persistent(clock.clone(), backend.clone())
			.expect("Empty backend should restore an empty registry.");

		registry.insert("thread-a");

		let raw = backend.raw(REGISTRY_STORE_KEY).expect("Insert should write a snapshot.");
		let value: serde_json::Value =
			serde_json::from_str(&raw).expect("Snapshot should be valid JSON.");

		assert_eq!(
			value,
			serde_json::json!({
				"state": { "thread-a": { "createdAt": 1_735_689_600_000_i64 } },
				"version": 0
			})
		);

		let restored = EphemeralRegistry::persistent(clock, backend)
			.expect("Existing snapshot should restore successfully.");

		assert_eq!(restored.created_at("thread-a"), Some(T0));
	}
}
