//! Batch step lifecycle, step status codes and the process log.

pub mod batch;
pub mod status;
pub mod wiki;

pub use batch::BatchSession;
pub use status::{StepEditType, StepStatus};
pub use wiki::WikiKind;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No steps selected for batch processing")]
    EmptyBatch,

    #[error("Process '{0}' not found")]
    ProcessNotFound(String),

    #[error("Step '{step}' not found in process '{process}'")]
    StepNotFound { process: String, step: String },

    #[error("No step selected")]
    NoStepSelected,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
