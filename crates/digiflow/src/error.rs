use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigiflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] crate::workflow::WorkflowError),

    #[error("Script error: {0}")]
    Script(#[from] crate::script::ScriptError),

    #[error("Export error: {0}")]
    Export(#[from] crate::export::ExportError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid validation pattern for property '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Source directory does not exist: {0}")]
    MissingSource(PathBuf),

    #[error("Target directory is not empty: {0}")]
    TargetNotEmpty(PathBuf),
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task channel closed unexpectedly")]
    ChannelClosed,

    #[error("Background task manager not running")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, DigiflowError>;
