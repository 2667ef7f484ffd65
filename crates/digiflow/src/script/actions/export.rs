//! DMS export action.

use crate::db::process_repo::ProcessRow;
use crate::export::DmsExport;
use crate::messages::MessageLog;
use crate::script::{ActionContext, ScriptCommand, ScriptError};
use crate::tasks::{ProcessTask, TaskKind};

/// `exportDms [images:true|false] [ocr:true|false]`
///
/// Runs through the task manager when one is attached, otherwise
/// synchronously. Export failures are per-process and never stop the
/// remaining batch.
pub fn export_dms(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let with_images = cmd.bool_param("images", true)?;
    let with_ocr = cmd.bool_param("ocr", false)?;

    for process in processes {
        if let Some(tasks) = ctx.tasks {
            match tasks.submit(ProcessTask::new(
                process.id,
                TaskKind::Export {
                    with_images,
                    with_ocr,
                },
            )) {
                Ok(()) => log.info(ctx.catalog.resolve_with("exportQueued", &[&process.title])),
                Err(e) => log.error(e.to_string()),
            }
            continue;
        }

        match DmsExport::new(with_images, with_ocr).run(ctx.db, ctx.layout, process.id) {
            Ok(_) => log.info(
                ctx.catalog
                    .resolve_with("exportFinished", &[&process.title]),
            ),
            Err(e) => log.error(e.to_string()),
        }
    }
    Ok(())
}
