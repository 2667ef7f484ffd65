//! Actions on whole processes.

use crate::db::{process_repo, process_repo::ProcessRow, project_repo};
use crate::error::TaskError;
use crate::messages::MessageLog;
use crate::script::{ActionContext, ScriptCommand, ScriptError};
use crate::tasks::{ProcessTask, TaskKind};

/// `setRuleset ruleset:..`
pub fn set_ruleset(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let ruleset_title = cmd.require("ruleset")?;
    let ruleset = project_repo::find_ruleset_by_title(ctx.db, ruleset_title)?.ok_or_else(|| {
        ScriptError::InvalidParameter {
            name: "ruleset".to_string(),
            reason: ctx.catalog.resolve_with("rulesetUnknown", &[ruleset_title]),
        }
    })?;

    for process in processes {
        process_repo::set_ruleset(ctx.db, process.id, ruleset.id)?;
        log.info(
            ctx.catalog
                .resolve_with("rulesetSet", &[ruleset_title, &process.title]),
        );
    }
    Ok(())
}

/// `deleteProcess [contentOnly:true|false]` — defaults to content only.
pub fn delete_process(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let content_only = cmd.bool_param("contentOnly", true)?;

    for process in processes {
        let result = if content_only {
            ctx.layout.delete_content(process.id).map_err(ScriptError::from)
        } else {
            ctx.layout
                .delete_all(process.id)
                .map_err(ScriptError::from)
                .and_then(|()| {
                    process_repo::delete(ctx.db, process.id).map_err(ScriptError::from)
                })
        };
        match result {
            Ok(()) => {
                let key = if content_only {
                    "contentDeleted"
                } else {
                    "processDeleted"
                };
                log.info(ctx.catalog.resolve_with(key, &[&process.title]));
            }
            Err(e) => log.error(e.to_string()),
        }
    }
    Ok(())
}

/// `swapProcessesOut`
pub fn swap_processes_out(
    ctx: &ActionContext<'_>,
    _cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    enqueue(ctx, processes, TaskKind::SwapOut, log)
}

/// `swapProcessesIn`
pub fn swap_processes_in(
    ctx: &ActionContext<'_>,
    _cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    enqueue(ctx, processes, TaskKind::SwapIn, log)
}

fn enqueue(
    ctx: &ActionContext<'_>,
    processes: &[ProcessRow],
    kind: TaskKind,
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let tasks = ctx.tasks.ok_or(TaskError::NotConfigured)?;

    for process in processes {
        match tasks.submit(ProcessTask::new(process.id, kind.clone())) {
            Ok(()) => log.info(ctx.catalog.resolve_with("swapQueued", &[&process.title])),
            Err(e) => log.error(e.to_string()),
        }
    }
    Ok(())
}
