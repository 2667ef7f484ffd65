//! Automation scripts over sets of processes.

pub mod actions;
pub mod command;
pub mod registry;

pub use command::ScriptCommand;
pub use registry::{ActionContext, ScriptRunner};

use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::{StorageError, TaskError};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Missing action. Usage: action:<name> [parameters]")]
    MissingAction,

    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Missing parameter '{0}'")]
    MissingParameter(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Task(#[from] TaskError),
}
