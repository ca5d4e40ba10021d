// crates.io
use serde_json::{Value, json};
// self
use nexus_session::{
	_preludet::*,
	auth::CREDENTIAL_STORE_KEY,
	registry::REGISTRY_STORE_KEY,
	session::SessionContext,
	store::{FileBackend, SnapshotBackend},
};

fn stored_json(raw: Option<String>) -> Value {
	serde_json::from_str(&raw.expect("Snapshot should have been written."))
		.expect("Snapshot should be valid JSON.")
}

#[test]
fn credential_snapshot_uses_versioned_layout() {
	let (session, backend, _) = build_test_session("https://api.example.com");

	session.credentials.set_access_token("a1");

	assert_eq!(
		stored_json(backend.raw(CREDENTIAL_STORE_KEY)),
		json!({ "state": { "accessToken": "a1", "refreshToken": null }, "version": 0 })
	);

	session.credentials.set_refresh_token("r1");
	session.end_session();

	assert_eq!(
		stored_json(backend.raw(CREDENTIAL_STORE_KEY)),
		json!({ "state": { "accessToken": null, "refreshToken": null }, "version": 0 })
	);
}

#[test]
fn foreign_snapshot_version_starts_empty() {
	let (_, backend, clock) = build_test_session("https://api.example.com");

	backend
		.save(
			CREDENTIAL_STORE_KEY,
			json!({ "state": { "accessToken": "old", "refreshToken": null }, "version": 7 })
				.to_string(),
		)
		.expect("Memory backend save should succeed.");

	let session = SessionContext::builder(test_config("https://api.example.com"))
		.backend(backend)
		.clock(clock)
		.build()
		.expect("Unknown snapshot versions are discarded, not fatal.");

	assert!(session.credentials.access_token().is_none());
}

#[test]
fn registry_sweep_evicts_exactly_the_stale_entries() {
	let (session, backend, clock) = build_test_session("https://api.example.com");
	let registry = &session.new_threads;

	registry.insert("t1");
	clock.advance(Duration::milliseconds(1_000));
	registry.insert("t2");
	clock.advance(Duration::milliseconds(1_500));

	// t1 is 2.5s old and t2 is 1.5s old; both exceed one second.
	assert_eq!(registry.sweep(Duration::seconds(1)), vec!["t1".to_owned(), "t2".to_owned()]);
	assert!(registry.is_empty());
	assert_eq!(stored_json(backend.raw(REGISTRY_STORE_KEY)), json!({ "state": {}, "version": 0 }));
}

#[test]
fn registry_sweep_is_idempotent_and_keeps_boundary_entries() {
	let (session, _, clock) = build_test_session("https://api.example.com");
	let registry = &session.new_threads;

	registry.insert("stale");
	clock.advance(Duration::seconds(30));
	registry.insert("boundary");
	clock.advance(Duration::seconds(60));
	registry.insert("fresh");

	assert_eq!(registry.sweep_secs(60), vec!["stale".to_owned()]);
	assert_eq!(registry.keys(), vec!["boundary".to_owned(), "fresh".to_owned()]);
	assert!(registry.sweep_secs(60).is_empty());
	assert_eq!(registry.len(), 2);
}

#[test]
fn registry_snapshot_stores_unix_milliseconds() {
	let (session, backend, clock) = build_test_session("https://api.example.com");

	clock.advance(Duration::milliseconds(250));
	session.new_threads.insert("thread-a");

	let expected = (TEST_EPOCH.unix_timestamp_nanos() / 1_000_000) as i64 + 250;

	assert_eq!(
		stored_json(backend.raw(REGISTRY_STORE_KEY)),
		json!({ "state": { "thread-a": { "createdAt": expected } }, "version": 0 })
	);

	session.new_threads.remove("thread-a");

	assert_eq!(stored_json(backend.raw(REGISTRY_STORE_KEY)), json!({ "state": {}, "version": 0 }));
}

#[test]
fn file_backend_carries_state_across_sessions() {
	let path = std::env::temp_dir().join(format!("nexus-session-it-{}.json", std::process::id()));
	let _ = std::fs::remove_file(&path);
	let build = || {
		let backend = Arc::new(FileBackend::open(&path).expect("File backend should open."));

		SessionContext::builder(test_config("https://api.example.com"))
			.backend(backend)
			.build()
			.expect("File-backed session should build.")
	};
	let first = build();

	first.credentials.set_access_token("durable");
	first.credentials.set_refresh_token("renewal");
	first.new_threads.insert("thread-x");
	drop(first);

	let second = build();

	assert_eq!(
		second.credentials.access_token().map(|t| t.expose().to_owned()).as_deref(),
		Some("durable")
	);
	assert_eq!(
		second.credentials.refresh_token().map(|t| t.expose().to_owned()).as_deref(),
		Some("renewal")
	);
	assert!(second.new_threads.contains("thread-x"));

	let _ = std::fs::remove_file(&path);
}
