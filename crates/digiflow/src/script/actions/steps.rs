//! Actions that modify workflow steps.

use std::process::Command;

use crate::db::{process_repo::ProcessRow, step_repo, step_repo::NewStep};
use crate::messages::MessageLog;
use crate::script::{ActionContext, ScriptCommand, ScriptError};
use crate::workflow::StepStatus;

/// `swapSteps swap1nr:.. swap1title:.. swap2nr:.. swap2title:..`
///
/// Swaps the order of two steps, identified by both title and current
/// position so a stale script cannot hit the wrong step. Sequence
/// number and status move together, so an open step stays the open one
/// after the exchange.
pub fn swap_steps(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let nr1 = cmd.require_i64("swap1nr")?;
    let nr2 = cmd.require_i64("swap2nr")?;
    let title1 = cmd.require("swap1title")?;
    let title2 = cmd.require("swap2title")?;

    for process in processes {
        let step1 = step_repo::find_by_title(ctx.db, process.id, title1)?;
        let step2 = step_repo::find_by_title(ctx.db, process.id, title2)?;
        match (step1, step2) {
            (Some(mut s1), Some(mut s2)) if s1.sequence == nr1 && s2.sequence == nr2 => {
                std::mem::swap(&mut s1.sequence, &mut s2.sequence);
                std::mem::swap(&mut s1.status, &mut s2.status);
                step_repo::update(ctx.db, &s1)?;
                step_repo::update(ctx.db, &s2)?;
                log.info(ctx.catalog.resolve_with(
                    "stepsSwapped",
                    &[title1, title2, &process.title],
                ));
            }
            _ => {
                log.error(
                    ctx.catalog
                        .resolve_with("stepNotFound", &[title1, &process.title]),
                );
            }
        }
    }
    Ok(())
}

/// `addStep steptitle:.. number:..`
pub fn add_step(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let number = cmd.require_i64("number")?;

    for process in processes {
        let result = step_repo::insert(
            ctx.db,
            &NewStep {
                process_id: process.id,
                title: title.to_string(),
                sequence: number,
                ..Default::default()
            },
        );
        match result {
            Ok(_) => log.info(
                ctx.catalog
                    .resolve_with("stepAdded", &[title, &process.title]),
            ),
            Err(e) => log.error(e.to_string()),
        }
    }
    Ok(())
}

/// `deleteStep steptitle:..`
pub fn delete_step(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;

    for process in processes {
        match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(step) => {
                step_repo::delete(ctx.db, step.id)?;
                log.info(
                    ctx.catalog
                        .resolve_with("stepDeleted", &[title, &process.title]),
                );
            }
            None => log.error(
                ctx.catalog
                    .resolve_with("stepNotFound", &[title, &process.title]),
            ),
        }
    }
    Ok(())
}

/// `setStepNumber steptitle:.. number:..`
///
/// Processes without a matching step are left untouched.
pub fn set_step_number(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let number = cmd.require_i64("number")?;

    for process in processes {
        if let Some(step) = step_repo::find_by_title(ctx.db, process.id, title)? {
            step_repo::update_sequence(ctx.db, step.id, number)?;
            log.info(ctx.catalog.resolve_with(
                "stepNumberSet",
                &[title, &number.to_string(), &process.title],
            ));
        }
    }
    Ok(())
}

/// `setStepStatus steptitle:.. status:..` — status must be "0".."3".
pub fn set_step_status(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let raw_status = cmd.require("status")?;
    let status = StepStatus::parse_script_value(raw_status).ok_or_else(|| {
        ScriptError::InvalidParameter {
            name: "status".to_string(),
            reason: ctx.catalog.resolve("stepStatusInvalid"),
        }
    })?;

    for process in processes {
        match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(step) => {
                step_repo::update_status(ctx.db, step.id, status.value())?;
                log.info(ctx.catalog.resolve_with(
                    "stepStatusChanged",
                    &[title, raw_status, &process.title],
                ));
            }
            None => log.error(
                ctx.catalog
                    .resolve_with("stepNotFound", &[title, &process.title]),
            ),
        }
    }
    Ok(())
}

const TASK_FLAGS: &[&str] = &[
    "metadata",
    "readimages",
    "writeimages",
    "validate",
    "exportdms",
    "batch",
    "automatic",
];

/// `setTaskProperty steptitle:.. property:.. value:true|false`
pub fn set_task_property(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let property = cmd.require("property")?;
    if !TASK_FLAGS.contains(&property) {
        return Err(ScriptError::InvalidParameter {
            name: "property".to_string(),
            reason: format!("'{}' is not one of {}", property, TASK_FLAGS.join(", ")),
        });
    }
    let value = match cmd.require("value")? {
        "true" => true,
        "false" => false,
        other => {
            return Err(ScriptError::InvalidParameter {
                name: "value".to_string(),
                reason: format!("'{}' is not true or false", other),
            })
        }
    };

    for process in processes {
        match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(mut step) => {
                match property {
                    "metadata" => step.metadata_step = value,
                    "readimages" => step.reads_images = value,
                    "writeimages" => step.writes_images = value,
                    "validate" => step.validate_on_close = value,
                    "exportdms" => step.export_step = value,
                    "batch" => step.batch_step = value,
                    "automatic" => step.automatic = value,
                    _ => unreachable!(),
                }
                step_repo::update(ctx.db, &step)?;
                log.info(ctx.catalog.resolve_with(
                    "stepStatusChanged",
                    &[title, property, &process.title],
                ));
            }
            None => log.error(
                ctx.catalog
                    .resolve_with("stepNotFound", &[title, &process.title]),
            ),
        }
    }
    Ok(())
}

/// `addShellScriptToStep steptitle:.. label:.. script:..`
///
/// Fills the first free of the five script slots.
pub fn add_shell_script(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let label = cmd.require("label")?;
    let script = cmd.require("script")?;

    for process in processes {
        match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(mut step) => {
                let slot = {
                    let slots = [
                        (&mut step.script_name1, &mut step.script_path1),
                        (&mut step.script_name2, &mut step.script_path2),
                        (&mut step.script_name3, &mut step.script_path3),
                        (&mut step.script_name4, &mut step.script_path4),
                        (&mut step.script_name5, &mut step.script_path5),
                    ];
                    let mut found = false;
                    for (name, path) in slots {
                        if name.as_deref().map(str::is_empty).unwrap_or(true) {
                            *name = Some(label.to_string());
                            *path = Some(script.to_string());
                            found = true;
                            break;
                        }
                    }
                    found
                };
                if slot {
                    step.script_step = true;
                    step_repo::update(ctx.db, &step)?;
                    log.info(
                        ctx.catalog
                            .resolve_with("stepAdded", &[label, &process.title]),
                    );
                } else {
                    log.error(format!(
                        "All script slots of step '{}' in process '{}' are taken",
                        title, process.title
                    ));
                }
            }
            None => log.error(
                ctx.catalog
                    .resolve_with("stepNotFound", &[title, &process.title]),
            ),
        }
    }
    Ok(())
}

/// `addModuleToStep steptitle:.. module:..`
pub fn add_module(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let module = cmd.require("module")?;

    for process in processes {
        match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(mut step) => {
                step.module_name = Some(module.to_string());
                step_repo::update(ctx.db, &step)?;
                log.info(
                    ctx.catalog
                        .resolve_with("stepAdded", &[module, &process.title]),
                );
            }
            None => log.error(
                ctx.catalog
                    .resolve_with("stepNotFound", &[title, &process.title]),
            ),
        }
    }
    Ok(())
}

/// `runScript steptitle:.. [script:..]`
///
/// Runs the named shell script of the step, or all of its scripts when
/// no name is given. `{processid}`, `{processtitle}` and `{imagepath}`
/// placeholders in the script path are substituted per process.
pub fn run_script(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let script_name = cmd.param("script");

    for process in processes {
        let step = match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(step) => step,
            None => {
                log.error(
                    ctx.catalog
                        .resolve_with("stepNotFound", &[title, &process.title]),
                );
                continue;
            }
        };

        let scripts = step.scripts();
        let selected: Vec<(&String, &String)> = match script_name {
            Some(name) => scripts.iter().filter(|(n, _)| n.as_str() == name).collect(),
            None => scripts.iter().collect(),
        };
        if selected.is_empty() {
            log.error(format!(
                "No matching script on step '{}' in process '{}'",
                title, process.title
            ));
            continue;
        }

        for (name, path) in selected {
            let command_line = path
                .replace("{processid}", &process.id.to_string())
                .replace("{processtitle}", &process.title)
                .replace(
                    "{imagepath}",
                    &ctx.layout.images_dir(process.id).to_string_lossy(),
                );
            match Command::new("sh").arg("-c").arg(&command_line).status() {
                Ok(status) if status.success() => {
                    log.info(format!(
                        "Script '{}' finished for process '{}'",
                        name, process.title
                    ));
                }
                Ok(status) => {
                    log.error(format!(
                        "Script '{}' failed for process '{}' with {}",
                        name, process.title, status
                    ));
                }
                Err(e) => {
                    log.error(format!(
                        "Script '{}' could not be started for process '{}': {}",
                        name, process.title, e
                    ));
                }
            }
        }
    }
    Ok(())
}
