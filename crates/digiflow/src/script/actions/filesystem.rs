//! Actions touching process content on disk.

use std::fs;
use std::path::Path;

use crate::db::process_repo::ProcessRow;
use crate::messages::MessageLog;
use crate::script::{ActionContext, ScriptCommand, ScriptError};
use crate::storage::transfer;

/// `importFromFileSystem sourcefolder:..`
///
/// Copies the image files of `<sourcefolder>/<process title>` into the
/// master image directory. Processes whose images directory already has
/// content are skipped so a re-run cannot clobber scans.
pub fn import_from_filesystem(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let source_root = cmd.require("sourcefolder")?;

    for process in processes {
        let source = Path::new(source_root).join(&process.title);
        if !source.is_dir() {
            log.error(
                ctx.catalog
                    .resolve_with("importSourceMissing", &[&process.title]),
            );
            continue;
        }

        let images = ctx.layout.images_dir(process.id);
        if !transfer::dir_is_empty(&images)? {
            log.info(
                ctx.catalog
                    .resolve_with("importSkippedNotEmpty", &[&process.title]),
            );
            continue;
        }

        let result = ctx
            .layout
            .create_process_dirs(process.id)
            .and_then(|()| {
                let master = ctx.layout.master_image_dir(process.id, &process.title);
                transfer::copy_images(&source, &master)
            });
        match result {
            Ok(copied) => {
                tracing::info!(process_id = process.id, copied, "images imported");
                log.info(
                    ctx.catalog
                        .resolve_with("importFinished", &[&process.title]),
                );
            }
            Err(e) => log.error(e.to_string()),
        }
    }
    Ok(())
}

/// `deleteTiffHeaderFile`
pub fn delete_tiff_header(
    ctx: &ActionContext<'_>,
    _cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    for process in processes {
        let header = ctx.layout.tiff_header_file(process.id);
        if !header.is_file() {
            continue;
        }
        match fs::remove_file(&header) {
            Ok(()) => log.info(
                ctx.catalog
                    .resolve_with("tiffHeaderDeleted", &[&process.title]),
            ),
            Err(e) => log.error(format!(
                "Could not delete {} for process '{}': {}",
                header.display(),
                process.title,
                e
            )),
        }
    }
    Ok(())
}
