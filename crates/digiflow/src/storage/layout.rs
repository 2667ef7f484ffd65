//! On-disk layout of process content.
//!
//! Every process owns a directory named after its id below the storage
//! root, with `images/` and `ocr/` subdirectories. Master scans live in
//! `images/<title>_tif`. An optional swap root holds content that was
//! moved off the primary volume.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub const TIFF_HEADER_FILE: &str = "tiffwriter.conf";

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    swap_root: Option<PathBuf>,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>, swap_root: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            swap_root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn has_swap(&self) -> bool {
        self.swap_root.is_some()
    }

    pub fn process_dir(&self, process_id: i64) -> PathBuf {
        self.root.join(process_id.to_string())
    }

    pub fn images_dir(&self, process_id: i64) -> PathBuf {
        self.process_dir(process_id).join("images")
    }

    pub fn ocr_dir(&self, process_id: i64) -> PathBuf {
        self.process_dir(process_id).join("ocr")
    }

    /// Directory holding the master scans of a process.
    pub fn master_image_dir(&self, process_id: i64, process_title: &str) -> PathBuf {
        self.images_dir(process_id).join(format!("{}_tif", process_title))
    }

    pub fn tiff_header_file(&self, process_id: i64) -> PathBuf {
        self.images_dir(process_id).join(TIFF_HEADER_FILE)
    }

    /// Where the content of a process lives while swapped out.
    pub fn swap_dir(&self, process_id: i64) -> Option<PathBuf> {
        self.swap_root.as_ref().map(|r| r.join(process_id.to_string()))
    }

    /// Creates the directory skeleton for a process.
    pub fn create_process_dirs(&self, process_id: i64) -> Result<(), StorageError> {
        for dir in [self.images_dir(process_id), self.ocr_dir(process_id)] {
            fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Removes the images and ocr content of a process but keeps the
    /// process directory itself.
    pub fn delete_content(&self, process_id: i64) -> Result<(), StorageError> {
        for dir in [self.images_dir(process_id), self.ocr_dir(process_id)] {
            if dir.exists() {
                fs::remove_dir_all(&dir).map_err(|source| StorageError::Remove {
                    path: dir.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Removes the whole process directory.
    pub fn delete_all(&self, process_id: i64) -> Result<(), StorageError> {
        let dir = self.process_dir(process_id);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|source| StorageError::Remove {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
