//! Actions that assign users to steps.

use crate::db::{process_repo::ProcessRow, step_repo, user_repo};
use crate::messages::MessageLog;
use crate::script::{ActionContext, ScriptCommand, ScriptError};

/// `addUser steptitle:.. username:..`
pub fn add_user(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let username = cmd.require("username")?;
    let user = user_repo::find_by_login(ctx.db, username)?.ok_or_else(|| {
        ScriptError::InvalidParameter {
            name: "username".to_string(),
            reason: ctx.catalog.resolve_with("userUnknown", &[username]),
        }
    })?;

    for process in processes {
        match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(step) => {
                step_repo::assign_user(ctx.db, step.id, user.id)?;
                log.info(ctx.catalog.resolve_with(
                    "userAssigned",
                    &[username, title, &process.title],
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

/// `addUserGroup steptitle:.. group:..`
///
/// Assigns every member of the group to the step. A group with no
/// members is treated as unknown.
pub fn add_user_group(
    ctx: &ActionContext<'_>,
    cmd: &ScriptCommand,
    processes: &[ProcessRow],
    log: &mut MessageLog,
) -> Result<(), ScriptError> {
    let title = cmd.require("steptitle")?;
    let group = cmd.require("group")?;
    let members = user_repo::list_by_group(ctx.db, group)?;
    if members.is_empty() {
        return Err(ScriptError::InvalidParameter {
            name: "group".to_string(),
            reason: format!("group '{}' has no members", group),
        });
    }

    for process in processes {
        match step_repo::find_by_title(ctx.db, process.id, title)? {
            Some(step) => {
                for member in &members {
                    step_repo::assign_user(ctx.db, step.id, member.id)?;
                }
                log.info(ctx.catalog.resolve_with(
                    "userAssigned",
                    &[group, title, &process.title],
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
