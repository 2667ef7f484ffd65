//! Action registry and script execution.
//!
//! Every action is registered once in a name -> handler map; dispatch
//! is a plain lookup. Handlers validate their parameters before any
//! write, then loop over the selected processes. Parameter validation
//! failures surface as errors with nothing written; per-process
//! failures inside the loop are reported and the loop continues.

use std::collections::BTreeMap;

use tracing::info_span;

use crate::db::{process_repo::ProcessRow, Database};
use crate::messages::{MessageCatalog, MessageLog};
use crate::storage::StorageLayout;
use crate::tasks::TaskManager;

use super::actions;
use super::command::ScriptCommand;
use super::ScriptError;

/// Shared state handed to every action handler.
pub struct ActionContext<'a> {
    pub db: &'a Database,
    pub layout: &'a StorageLayout,
    pub tasks: Option<&'a TaskManager>,
    pub catalog: &'a MessageCatalog,
}

type Handler = fn(
    &ActionContext<'_>,
    &ScriptCommand,
    &[ProcessRow],
    &mut MessageLog,
) -> Result<(), ScriptError>;

const ACTIONS: &[(&str, Handler)] = &[
    ("swapSteps", actions::steps::swap_steps),
    ("addStep", actions::steps::add_step),
    ("deleteStep", actions::steps::delete_step),
    ("setStepNumber", actions::steps::set_step_number),
    ("setStepStatus", actions::steps::set_step_status),
    ("setTaskProperty", actions::steps::set_task_property),
    ("addShellScriptToStep", actions::steps::add_shell_script),
    ("addModuleToStep", actions::steps::add_module),
    ("runScript", actions::steps::run_script),
    ("addUser", actions::users::add_user),
    ("addUserGroup", actions::users::add_user_group),
    ("setRuleset", actions::process::set_ruleset),
    ("deleteProcess", actions::process::delete_process),
    ("swapProcessesOut", actions::process::swap_processes_out),
    ("swapProcessesIn", actions::process::swap_processes_in),
    ("importFromFileSystem", actions::filesystem::import_from_filesystem),
    ("deleteTiffHeaderFile", actions::filesystem::delete_tiff_header),
    ("exportDms", actions::export::export_dms),
    ("export", actions::export::export_dms),
];

/// Parses and dispatches automation scripts.
pub struct ScriptRunner {
    handlers: BTreeMap<&'static str, Handler>,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRunner {
    pub fn new() -> Self {
        let handlers: BTreeMap<&'static str, Handler> = ACTIONS.iter().copied().collect();
        debug_assert_eq!(handlers.len(), ACTIONS.len());
        Self { handlers }
    }

    /// Names of all registered actions, sorted.
    pub fn action_names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Runs a script over the given processes. Parse and validation
    /// failures return an error with nothing written; per-process
    /// failures are reported through `log` and execution continues.
    pub fn run(
        &self,
        ctx: &ActionContext<'_>,
        script: &str,
        processes: &[ProcessRow],
        log: &mut MessageLog,
    ) -> Result<(), ScriptError> {
        let span = info_span!("script", script);
        let _guard = span.enter();

        let command = match ScriptCommand::parse(script) {
            Ok(command) => command,
            Err(e) => {
                log.error(ctx.catalog.resolve("scriptMissingAction"));
                return Err(e);
            }
        };

        for token in command.malformed_tokens() {
            log.error(ctx.catalog.resolve_with("scriptMalformedToken", &[token]));
        }

        let handler = self.handlers.get(command.action()).ok_or_else(|| {
            let e = ScriptError::UnknownAction(command.action().to_string());
            log.error(
                ctx.catalog
                    .resolve_with("scriptUnknownAction", &[command.action()]),
            );
            e
        })?;

        match handler(ctx, &command, processes, log) {
            Ok(()) => {
                log.info(ctx.catalog.resolve("scriptFinished"));
                Ok(())
            }
            Err(e) => {
                log.error(e.to_string());
                Err(e)
            }
        }
    }
}
