//! digiflow — workflow management for digitization projects.
//!
//! Processes move through ordered workflow steps (scanning, metadata
//! capture, quality control, export). This crate covers the batch step
//! lifecycle with property editing and corrections, a line-based
//! automation script dispatcher over sets of processes, the on-disk
//! content layout, DMS export and the background task pool for swap
//! and export work.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod messages;
pub mod properties;
pub mod script;
pub mod storage;
pub mod tasks;
pub mod workflow;

pub use config::{load_config, Config};
pub use db::Database;
pub use error::{ConfigError, DigiflowError, Result, StorageError, TaskError};
pub use export::DmsExport;
pub use messages::{MessageCatalog, MessageLog};
pub use script::{ActionContext, ScriptRunner};
pub use storage::StorageLayout;
pub use tasks::TaskManager;
pub use workflow::{BatchSession, StepStatus};

use tracing_subscriber::EnvFilter;

/// Initializes tracing with an env-filterable fmt subscriber and routes
/// `log` records through it. Safe to call more than once; later calls
/// are no-ops.
pub fn init_logging() {
    let _ = tracing_log::LogTracer::init();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
