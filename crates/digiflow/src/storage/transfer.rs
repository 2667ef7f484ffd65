//! Directory copy and move primitives used by import, export and swap.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::StorageError;

/// Recursively copies a directory tree. Returns the number of files
/// copied.
pub fn copy_dir_recursive(from: &Path, to: &Path) -> Result<usize, StorageError> {
    if !from.is_dir() {
        return Err(StorageError::MissingSource(from.to_path_buf()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|source| StorageError::ScanFailed {
            path: from.to_path_buf(),
            source,
        })?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .unwrap_or_else(|_| Path::new(""));
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| StorageError::CreateDirectory {
                path: target.clone(),
                source,
            })?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::copy(entry.path(), &target).map_err(|source| StorageError::CopyFile {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Moves a directory. Tries a rename first and falls back to
/// copy-and-remove for cross-device moves.
pub fn move_dir(from: &Path, to: &Path) -> Result<(), StorageError> {
    if !from.is_dir() {
        return Err(StorageError::MissingSource(from.to_path_buf()));
    }
    if to.exists() && !dir_is_empty(to)? {
        return Err(StorageError::TargetNotEmpty(to.to_path_buf()));
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_dir_recursive(from, to)?;
            fs::remove_dir_all(from).map_err(|source| StorageError::Remove {
                path: from.to_path_buf(),
                source,
            })?;
            Ok(())
        }
    }
}

/// Whether a directory exists and contains no entries.
pub fn dir_is_empty(dir: &Path) -> Result<bool, StorageError> {
    if !dir.exists() {
        return Ok(true);
    }
    let mut entries = fs::read_dir(dir).map_err(|source| StorageError::Remove {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

/// Whether a file looks like an image, judged by its extension.
pub fn is_image_file(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false)
}

/// Copies only the image files of a source directory tree into the
/// target, preserving relative paths. Returns the number of files
/// copied.
pub fn copy_images(from: &Path, to: &Path) -> Result<usize, StorageError> {
    if !from.is_dir() {
        return Err(StorageError::MissingSource(from.to_path_buf()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|source| StorageError::ScanFailed {
            path: from.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() || !is_image_file(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(from)
            .unwrap_or_else(|_| Path::new(""));
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(entry.path(), &target).map_err(|source| StorageError::CopyFile {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source,
        })?;
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_copy_dir_recursive() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_file(&src.join("a.txt"), "a");
        write_file(&src.join("sub/b.txt"), "b");

        let copied = copy_dir_recursive(&src, &dst).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("sub/b.txt")).unwrap(), "b");
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let result = copy_dir_recursive(&tmp.path().join("nope"), &tmp.path().join("dst"));
        assert!(matches!(result, Err(StorageError::MissingSource(_))));
    }

    #[test]
    fn test_move_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_file(&src.join("a.txt"), "a");

        move_dir(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
    }

    #[test]
    fn test_move_into_nonempty_target_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_file(&src.join("a.txt"), "a");
        write_file(&dst.join("existing.txt"), "x");

        let result = move_dir(&src, &dst);
        assert!(matches!(result, Err(StorageError::TargetNotEmpty(_))));
        assert!(src.exists());
    }

    #[test]
    fn test_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(dir_is_empty(&tmp.path().join("missing")).unwrap());
        assert!(dir_is_empty(tmp.path()).unwrap());

        write_file(&tmp.path().join("f"), "x");
        assert!(!dir_is_empty(tmp.path()).unwrap());
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(&PathBuf::from("scan.tif")));
        assert!(is_image_file(&PathBuf::from("page.jpg")));
        assert!(!is_image_file(&PathBuf::from("meta.xml")));
        assert!(!is_image_file(&PathBuf::from("noext")));
    }

    #[test]
    fn test_copy_images_filters_non_images() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_file(&src.join("page1.tif"), "img");
        write_file(&src.join("meta.xml"), "<x/>");
        write_file(&src.join("sub/page2.jpg"), "img");

        let copied = copy_images(&src, &dst).unwrap();
        assert_eq!(copied, 2);
        assert!(dst.join("page1.tif").exists());
        assert!(dst.join("sub/page2.jpg").exists());
        assert!(!dst.join("meta.xml").exists());
    }
}
