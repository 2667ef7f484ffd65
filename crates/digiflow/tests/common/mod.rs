//! Shared test utilities for digiflow integration tests.

use tempfile::TempDir;

use digiflow::db::{process_repo, process_repo::ProcessRow, step_repo, step_repo::NewStep};
use digiflow::{Database, MessageCatalog, StorageLayout};

/// Isolated database + storage + catalog for one test.
pub struct TestHarness {
    pub db: Database,
    pub layout: StorageLayout,
    pub catalog: MessageCatalog,
    _tmp: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_in_memory().expect("Failed to open test database");
        let layout = StorageLayout::new(
            tmp.path().join("store"),
            Some(tmp.path().join("archive")),
        );
        Self {
            db,
            layout,
            catalog: MessageCatalog::load("en"),
            _tmp: tmp,
        }
    }
}

/// Seeds a process with steps given as `(title, sequence, status)`.
pub fn seed_process(db: &Database, title: &str, steps: &[(&str, i64, i64)]) -> ProcessRow {
    let pid = process_repo::insert(db, title, None, None, "2026-01-01T00:00:00Z")
        .expect("Failed to insert process");
    for (step_title, sequence, status) in steps {
        step_repo::insert(
            db,
            &NewStep {
                process_id: pid,
                title: step_title.to_string(),
                sequence: *sequence,
                status: *status,
                ..Default::default()
            },
        )
        .expect("Failed to insert step");
    }
    process_repo::find_by_id(db, pid).unwrap().unwrap()
}
