use std::{
	env, fs,
	path::{Path, PathBuf},
	sync::atomic::{AtomicU64, Ordering},
	thread,
	time::{SystemTime, UNIX_EPOCH},
};

use sift_storage::{ConfigStore, Error, FileStore, MemoryStore, SCORING_WEIGHTS_KEY};

fn temp_root() -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("sift_storage_test_{nanos}_{pid}_{ordinal}"));

	path
}

fn leftover_temp_files(root: &Path) -> usize {
	fs::read_dir(root)
		.expect("Failed to list store.")
		.filter_map(|entry| entry.ok())
		.filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
		.count()
}

fn exercise_store(store: &dyn ConfigStore) {
	assert_eq!(store.get_bytes(SCORING_WEIGHTS_KEY).expect("Failed to read."), None);

	store.set_bytes(SCORING_WEIGHTS_KEY, b"{\"a\":1}").expect("Failed to write.");

	assert_eq!(
		store.get_bytes(SCORING_WEIGHTS_KEY).expect("Failed to read."),
		Some(b"{\"a\":1}".to_vec()),
	);

	store.set_bytes(SCORING_WEIGHTS_KEY, b"true").expect("Failed to overwrite.");

	assert_eq!(
		store.get_bytes(SCORING_WEIGHTS_KEY).expect("Failed to read."),
		Some(b"true".to_vec()),
	);
}

#[test]
fn memory_store_reads_back_writes() {
	exercise_store(&MemoryStore::new());
}

#[test]
fn file_store_reads_back_writes() {
	let root = temp_root();
	let store = FileStore::open(&root).expect("Failed to open file store.");

	exercise_store(&store);

	assert_eq!(leftover_temp_files(&root), 0);

	fs::remove_dir_all(&root).expect("Failed to remove test store.");
}

#[test]
fn file_store_survives_concurrent_writers_on_one_key() {
	let root = temp_root();
	let store = FileStore::open(&root).expect("Failed to open file store.");
	let payloads: Vec<Vec<u8>> =
		(0..8).map(|writer| format!("{{\"writer\":{writer}}}").repeat(512).into_bytes()).collect();

	thread::scope(|scope| {
		for payload in &payloads {
			let store = &store;

			scope.spawn(move || {
				for _ in 0..25 {
					store.set_bytes(SCORING_WEIGHTS_KEY, payload).expect("Concurrent write failed.");
				}
			});
		}
	});

	let stored = store
		.get_bytes(SCORING_WEIGHTS_KEY)
		.expect("Failed to read.")
		.expect("Value must be present.");

	assert!(payloads.contains(&stored));
	assert_eq!(leftover_temp_files(&root), 0);

	fs::remove_dir_all(&root).expect("Failed to remove test store.");
}

#[test]
fn file_store_persists_across_instances() {
	let root = temp_root();

	FileStore::open(&root)
		.expect("Failed to open file store.")
		.set_bytes("tracing.enabled", b"true")
		.expect("Failed to write.");

	let reopened = FileStore::open(&root).expect("Failed to reopen file store.");
	let value = reopened.get_bytes("tracing.enabled").expect("Failed to read.");

	fs::remove_dir_all(&root).expect("Failed to remove test store.");

	assert_eq!(value, Some(b"true".to_vec()));
}

#[test]
fn keys_that_escape_the_root_are_rejected() {
	let store = MemoryStore::new();

	for key in ["", ".", "..", "../weights", "a/b", "weights json"] {
		assert!(
			matches!(store.set_bytes(key, b"x"), Err(Error::InvalidKey(_))),
			"key {key:?} should be rejected",
		);
	}
}
