//! Long-running background tasks.
//!
//! Swapping process content between volumes and exporting to the DMS
//! run on a small worker pool so the caller does not block on disk IO.

pub mod pool;

use uuid::Uuid;

pub use pool::TaskManager;

/// A unit of background work on one process.
#[derive(Debug, Clone)]
pub struct ProcessTask {
    pub id: Uuid,
    pub process_id: i64,
    pub kind: TaskKind,
}

impl ProcessTask {
    pub fn new(process_id: i64, kind: TaskKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            process_id,
            kind,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Move process content from the storage root to the swap volume.
    SwapOut,
    /// Move process content back from the swap volume.
    SwapIn,
    /// Export the process to the DMS.
    Export { with_images: bool, with_ocr: bool },
}

/// What became of a submitted task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task_id: Uuid,
    pub process_id: i64,
    pub success: bool,
    pub message: String,
}
