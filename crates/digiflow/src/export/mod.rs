//! DMS export.
//!
//! Exporting places a copy of a process below the export root of its
//! project so the downstream document management system can pick it up.
//! Image and OCR payloads are optional; a plain export only creates the
//! target directory with whatever payloads were requested.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info_span;

use crate::db::{process_repo, project_repo, Database, DatabaseError};
use crate::error::StorageError;
use crate::storage::{transfer, StorageLayout};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Process {0} not found")]
    ProcessNotFound(i64),

    #[error("Process '{0}' has no project")]
    MissingProject(String),

    #[error("Project '{0}' has no DMS export root")]
    MissingExportRoot(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A configured export run.
#[derive(Debug, Clone, Copy)]
pub struct DmsExport {
    pub with_images: bool,
    pub with_ocr: bool,
}

impl DmsExport {
    pub fn new(with_images: bool, with_ocr: bool) -> Self {
        Self {
            with_images,
            with_ocr,
        }
    }

    /// Exports a process, returning the created target directory.
    pub fn run(
        &self,
        db: &Database,
        layout: &StorageLayout,
        process_id: i64,
    ) -> Result<PathBuf, ExportError> {
        let span = info_span!("dms_export", process_id);
        let _guard = span.enter();

        let process = process_repo::find_by_id(db, process_id)?
            .ok_or(ExportError::ProcessNotFound(process_id))?;
        let project_id = process
            .project_id
            .ok_or_else(|| ExportError::MissingProject(process.title.clone()))?;
        let project = project_repo::find_project_by_id(db, project_id)?
            .ok_or_else(|| ExportError::MissingProject(process.title.clone()))?;
        let export_root = project
            .dms_export_root
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ExportError::MissingExportRoot(project.title.clone()))?;

        let target = PathBuf::from(export_root).join(&process.title);
        fs::create_dir_all(&target).map_err(|source| StorageError::CreateDirectory {
            path: target.clone(),
            source,
        })?;

        if self.with_images {
            let master = layout.master_image_dir(process_id, &process.title);
            if master.is_dir() {
                let copied =
                    transfer::copy_dir_recursive(&master, &target.join("images"))?;
                tracing::info!(copied, "exported master images");
            }
        }

        if self.with_ocr {
            let ocr = layout.ocr_dir(process_id);
            if ocr.is_dir() && !transfer::dir_is_empty(&ocr)? {
                let copied = transfer::copy_dir_recursive(&ocr, &target.join("ocr"))?;
                tracing::info!(copied, "exported ocr results");
            }
        }

        Ok(target)
    }
}
