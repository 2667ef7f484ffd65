//! Database module for persistent storage.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle.
//! All access is serialized through a `Mutex<Connection>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod history_repo;
pub mod migrations;
pub mod process_repo;
pub mod project_repo;
pub mod property_repo;
pub mod step_repo;
pub mod user_repo;

pub use error::DatabaseError;

/// How often opening a connection is retried before giving up.
const MAX_OPEN_ATTEMPTS: u32 = 5;

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). All access is serialized through
/// a `Mutex`, which is fine for SQLite (which serializes writes anyway).
/// WAL mode is enabled for concurrent read performance.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    ///
    /// Opening is retried up to [`MAX_OPEN_ATTEMPTS`] times; each attempt
    /// probes the connection before it is accepted.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut last_failure = String::new();
        for attempt in 1..=MAX_OPEN_ATTEMPTS {
            match Self::try_open(path) {
                Ok(conn) => {
                    migrations::run_all(&conn)?;
                    log::info!("Database opened at {}", path.display());
                    return Ok(Self {
                        conn: Arc::new(Mutex::new(conn)),
                    });
                }
                Err(e) => {
                    log::warn!("Connection attempt {} failed: {}", attempt, e);
                    last_failure = e.to_string();
                }
            }
        }

        Err(DatabaseError::OpenFailed {
            attempts: MAX_OPEN_ATTEMPTS,
            reason: last_failure,
        })
    }

    fn try_open(path: &Path) -> Result<Connection, DatabaseError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        // Probe the connection before handing it out.
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(conn)
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// Returns the canonical database path: `~/.digiflow/data/digiflow.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".digiflow").join("data").join("digiflow.db"))
}
