//! Batch step editing.
//!
//! A [`BatchSession`] operates on a set of same-titled steps, one per
//! process, and applies property edits, corrections and closings either
//! to the currently selected step or to every step in the batch.
//!
//! Validation failures abort before anything is written. Per-process
//! database failures during a for-all pass are logged and the pass
//! continues with the remaining processes.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info_span;

use crate::db::{
    history_repo, history_repo::HistoryKind, process_repo, property_repo, step_repo,
    step_repo::StepRow, Database,
};
use crate::messages::{MessageCatalog, MessageLog};
use crate::properties::{self, ProcessProperty, PropertyTemplate};

use super::status::{StepEditType, StepStatus};
use super::wiki::{self, WikiKind};
use super::WorkflowError;

pub struct BatchSession {
    db: Database,
    catalog: MessageCatalog,
    templates: Vec<PropertyTemplate>,
    steps: Vec<StepRow>,
    current: usize,
    process_titles: HashMap<i64, String>,
    properties: Vec<ProcessProperty>,
    pub problem_step: Option<String>,
    pub problem_message: String,
    pub solution_step: Option<String>,
    pub solution_message: String,
}

impl BatchSession {
    /// Opens a session over the given steps. Each step is expected to
    /// belong to a different process.
    pub fn new(
        db: Database,
        catalog: MessageCatalog,
        templates: Vec<PropertyTemplate>,
        steps: Vec<StepRow>,
    ) -> Result<Self, WorkflowError> {
        if steps.is_empty() {
            return Err(WorkflowError::EmptyBatch);
        }

        let mut process_titles = HashMap::new();
        for step in &steps {
            let process = process_repo::find_by_id(&db, step.process_id)?
                .ok_or_else(|| WorkflowError::ProcessNotFound(step.process_id.to_string()))?;
            process_titles.insert(step.process_id, process.title);
        }

        let mut session = Self {
            db,
            catalog,
            templates,
            steps,
            current: 0,
            process_titles,
            properties: Vec::new(),
            problem_step: None,
            problem_message: String::new(),
            solution_step: None,
            solution_message: String::new(),
        };
        session.reload_properties()?;
        Ok(session)
    }

    pub fn current_step(&self) -> &StepRow {
        &self.steps[self.current]
    }

    pub fn steps(&self) -> &[StepRow] {
        &self.steps
    }

    pub fn properties(&self) -> &[ProcessProperty] {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut [ProcessProperty] {
        &mut self.properties
    }

    fn process_title(&self, process_id: i64) -> &str {
        self.process_titles
            .get(&process_id)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Switches the current step to the one belonging to the process
    /// with the given title.
    pub fn set_current_by_process_title(&mut self, title: &str) -> Result<(), WorkflowError> {
        let index = self
            .steps
            .iter()
            .position(|s| self.process_title(s.process_id) == title)
            .ok_or_else(|| WorkflowError::ProcessNotFound(title.to_string()))?;
        self.current = index;
        self.reload_properties()
    }

    /// Reloads the properties of the current process, merged with the
    /// templates bound to the current step title.
    pub fn reload_properties(&mut self) -> Result<(), WorkflowError> {
        let step = &self.steps[self.current];
        self.properties = properties::load_process_properties(
            &self.db,
            step.process_id,
            &self.templates,
            Some(&step.title),
        )?;
        Ok(())
    }

    /// Groups the current properties by container, with placeholders for
    /// container numbers that only other batch members use.
    pub fn containers(
        &self,
    ) -> Result<std::collections::BTreeMap<i64, Option<crate::properties::PropertyGroup>>, WorkflowError>
    {
        let mut peer_containers = Vec::new();
        for step in &self.steps {
            if step.process_id == self.current_step().process_id {
                continue;
            }
            for row in property_repo::list_for_process(&self.db, step.process_id)? {
                peer_containers.push(row.container);
            }
        }
        Ok(properties::build_containers(&self.properties, &peer_containers))
    }

    // ── property saving ──

    /// Saves the properties of one container for the current process.
    /// Any invalid property aborts the save with nothing written.
    pub fn save_container(&mut self, container: i64, log: &mut MessageLog) -> Result<(), WorkflowError> {
        if !self.validate_container(container, log) {
            return Ok(());
        }
        let process_id = self.current_step().process_id;
        self.persist_container(process_id, container)?;
        log.info(
            self.catalog
                .resolve_with("propertiesSaved", &[self.process_title(process_id)]),
        );
        self.reload_properties()
    }

    /// Saves the properties of one container for every process in the
    /// batch. A validation failure aborts the whole pass before any
    /// process is written; a database failure on one process is logged
    /// and the pass continues.
    pub fn save_container_for_all(
        &mut self,
        container: i64,
        log: &mut MessageLog,
    ) -> Result<(), WorkflowError> {
        if !self.validate_container(container, log) {
            return Ok(());
        }
        let process_ids: Vec<i64> = self.steps.iter().map(|s| s.process_id).collect();
        for process_id in process_ids {
            match self.persist_container(process_id, container) {
                Ok(()) => log.info(
                    self.catalog
                        .resolve_with("propertiesSaved", &[self.process_title(process_id)]),
                ),
                Err(e) => {
                    tracing::warn!(process_id, error = %e, "property save failed");
                    log.error(
                        self.catalog
                            .resolve_with("propertiesNotSaved", &[self.process_title(process_id)]),
                    );
                }
            }
        }
        self.reload_properties()
    }

    fn validate_container(&self, container: i64, log: &mut MessageLog) -> bool {
        let mut valid = true;
        for property in self.properties.iter().filter(|p| p.container == container) {
            if !property.is_valid() {
                log.error(self.catalog.resolve_with("propertyInvalid", &[&property.name]));
                valid = false;
            }
        }
        valid
    }

    /// Writes the in-memory properties of a container to one process.
    /// Untitled leftovers are purged first. Properties loaded from the
    /// target process keep their row identity, so editing a name
    /// updates the row instead of leaving the old one behind. For any
    /// other process a property matching by name and container is
    /// updated in place, otherwise a new row is created.
    fn persist_container(&self, process_id: i64, container: i64) -> Result<(), WorkflowError> {
        property_repo::delete_untitled(&self.db, process_id)?;

        let now = Utc::now().to_rfc3339();
        for property in self.properties.iter().filter(|p| p.container == container) {
            if property.process_id == process_id {
                if let Some(id) = property.id {
                    property_repo::update_title_and_value(
                        &self.db,
                        id,
                        &property.name,
                        &property.value,
                    )?;
                    continue;
                }
            }
            let existing = property_repo::find_by_title_and_container(
                &self.db,
                process_id,
                &property.name,
                container,
            )?;
            match existing {
                Some(row) => property_repo::update_value(&self.db, row.id, &property.value)?,
                None => {
                    property_repo::insert(
                        &self.db,
                        process_id,
                        Some(&property.name),
                        &property.value,
                        container,
                        &now,
                    )?;
                }
            }
        }
        Ok(())
    }

    // ── container duplication ──

    /// Duplicates a property group into the smallest unused container id
    /// for the current process. Container zero holds standalone
    /// properties and cannot be duplicated.
    pub fn duplicate_container(
        &mut self,
        container: i64,
        log: &mut MessageLog,
    ) -> Result<(), WorkflowError> {
        let process_id = self.current_step().process_id;
        self.duplicate_container_in(process_id, container, log)?;
        self.reload_properties()
    }

    /// Duplicates a property group for every process in the batch.
    pub fn duplicate_container_for_all(
        &mut self,
        container: i64,
        log: &mut MessageLog,
    ) -> Result<(), WorkflowError> {
        let process_ids: Vec<i64> = self.steps.iter().map(|s| s.process_id).collect();
        for process_id in process_ids {
            if let Err(e) = self.duplicate_container_in(process_id, container, log) {
                tracing::warn!(process_id, error = %e, "container duplication failed");
                log.error(
                    self.catalog
                        .resolve_with("propertiesNotSaved", &[self.process_title(process_id)]),
                );
            }
        }
        self.reload_properties()
    }

    fn duplicate_container_in(
        &self,
        process_id: i64,
        container: i64,
        log: &mut MessageLog,
    ) -> Result<(), WorkflowError> {
        if container == 0 {
            log.error(self.catalog.resolve("containerZeroNotDuplicable"));
            return Ok(());
        }

        let rows = property_repo::list_for_process(&self.db, process_id)?;
        let target = properties::next_container_id(rows.iter().map(|r| r.container));
        let now = Utc::now().to_rfc3339();

        for row in rows.iter().filter(|r| r.container == container) {
            property_repo::insert(
                &self.db,
                process_id,
                row.title.as_deref(),
                &row.value,
                target,
                &now,
            )?;
        }

        log.info(self.catalog.resolve_with(
            "containerDuplicated",
            &[&container.to_string(), &target.to_string()],
        ));
        Ok(())
    }

    // ── corrections ──

    /// Steps of the current process a problem can be sent back to,
    /// nearest first.
    pub fn previous_step_titles(&self) -> Result<Vec<String>, WorkflowError> {
        let step = self.current_step();
        let rows = step_repo::list_before(&self.db, step.process_id, step.sequence)?;
        Ok(rows.into_iter().map(|s| s.title).collect())
    }

    /// Reports a problem to an earlier step of the current process. The
    /// reporting step is locked, the problem step reopens for
    /// correction, and everything between is locked as well.
    pub fn report_problem(&mut self, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let step = self.steps[self.current].clone();
        self.report_problem_on(&step, log)?;
        self.refresh_steps()
    }

    /// Reports the same problem for every process in the batch. A
    /// failure on one process is logged and the pass continues.
    pub fn report_problem_for_all(&mut self, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let steps = self.steps.clone();
        for step in &steps {
            if let Err(e) = self.report_problem_on(step, log) {
                tracing::warn!(process_id = step.process_id, error = %e, "problem report failed");
                log.error(e.to_string());
            }
        }
        self.refresh_steps()
    }

    fn report_problem_on(&self, step: &StepRow, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let span = info_span!("report_problem", process_id = step.process_id);
        let _guard = span.enter();

        let problem_title = self
            .problem_step
            .as_deref()
            .ok_or(WorkflowError::NoStepSelected)?;
        let process_title = self.process_title(step.process_id).to_string();
        let mut problem = step_repo::find_by_title(&self.db, step.process_id, problem_title)?
            .ok_or_else(|| WorkflowError::StepNotFound {
                process: process_title.clone(),
                step: problem_title.to_string(),
            })?;

        let now = Utc::now();
        let now_text = now.to_rfc3339();

        // Reopen the step the problem is sent to.
        problem.status = StepStatus::Open.value();
        problem.correction = true;
        problem.started_at = None;
        problem.edited_at = Some(now_text.clone());
        step_repo::update(&self.db, &problem)?;

        // Lock everything after it up to and including the reporting step.
        let affected =
            step_repo::list_between(&self.db, step.process_id, problem.sequence, step.sequence)?;
        for mut between in affected {
            between.status = StepStatus::Locked.value();
            between.correction = true;
            between.edit_type = StepEditType::ManualMulti.value();
            between.edited_at = Some(now_text.clone());
            step_repo::update(&self.db, &between)?;
        }

        self.append_wiki(
            step.process_id,
            WikiKind::Error,
            &self
                .catalog
                .resolve_with("correctionFor", &[&self.problem_message]),
        )?;
        history_repo::insert(
            &self.db,
            step.process_id,
            HistoryKind::StepError,
            Some(problem.sequence as f64),
            Some(&problem.title),
            &now_text,
        )?;

        log.info(
            self.catalog
                .resolve_with("correctionMessageSentTo", &[&problem.title]),
        );
        Ok(())
    }

    /// Steps of the current process a solution can be forwarded to,
    /// nearest first.
    pub fn following_step_titles(&self) -> Result<Vec<String>, WorkflowError> {
        let step = self.current_step();
        let rows = step_repo::list_for_process(&self.db, step.process_id)?;
        Ok(rows
            .into_iter()
            .filter(|s| s.sequence > step.sequence)
            .map(|s| s.title)
            .collect())
    }

    /// Closes a finished correction on the current process. Everything
    /// from the correction step up to the solution step is marked done,
    /// then the solution step reopens.
    pub fn solve_problem(&mut self, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let step = self.steps[self.current].clone();
        self.solve_problem_on(&step, log)?;
        self.refresh_steps()
    }

    /// Closes the correction for every process in the batch.
    pub fn solve_problem_for_all(&mut self, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let steps = self.steps.clone();
        for step in &steps {
            if let Err(e) = self.solve_problem_on(step, log) {
                tracing::warn!(process_id = step.process_id, error = %e, "problem solve failed");
                log.error(e.to_string());
            }
        }
        self.refresh_steps()
    }

    fn solve_problem_on(&self, step: &StepRow, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let span = info_span!("solve_problem", process_id = step.process_id);
        let _guard = span.enter();

        let solution_title = self
            .solution_step
            .as_deref()
            .ok_or(WorkflowError::NoStepSelected)?;
        let process_title = self.process_title(step.process_id).to_string();
        let mut solution = step_repo::find_by_title(&self.db, step.process_id, solution_title)?
            .ok_or_else(|| WorkflowError::StepNotFound {
                process: process_title.clone(),
                step: solution_title.to_string(),
            })?;

        let now = Utc::now();
        let now_text = now.to_rfc3339();

        // Close everything from the correction step up to the solution.
        let span_steps =
            step_repo::list_span(&self.db, step.process_id, step.sequence, solution.sequence)?;
        for mut done in span_steps {
            if done.id == solution.id {
                continue;
            }
            done.status = StepStatus::Done.value();
            done.priority = 0;
            done.correction = false;
            done.edit_type = StepEditType::ManualMulti.value();
            done.finished_at = Some(now_text.clone());
            done.edited_at = Some(now_text.clone());
            step_repo::update(&self.db, &done)?;
        }

        // Reopen the step that reported the problem.
        solution.status = StepStatus::Open.value();
        solution.correction = true;
        solution.priority = 0;
        solution.edited_at = Some(now_text.clone());
        step_repo::update(&self.db, &solution)?;

        self.append_wiki(
            step.process_id,
            WikiKind::Info,
            &self
                .catalog
                .resolve_with("correctionSolutionFor", &[&self.solution_message]),
        )?;
        history_repo::insert(
            &self.db,
            step.process_id,
            HistoryKind::StepDone,
            Some(step.sequence as f64),
            Some(&step.title),
            &now_text,
        )?;

        log.info(
            self.catalog
                .resolve_with("correctionSolvedTo", &[&solution.title]),
        );
        Ok(())
    }

    // ── batch lifecycle ──

    /// Reopens every step in the batch for manual editing.
    pub fn return_all(&mut self, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let now_text = Utc::now().to_rfc3339();
        for step in &mut self.steps {
            step.status = StepStatus::Open.value();
            step.edit_type = StepEditType::ManualMulti.value();
            step.edited_at = Some(now_text.clone());
            step_repo::update(&self.db, step)?;
        }
        log.info(self.catalog.resolve("batchReturned"));
        Ok(())
    }

    /// Closes every step in the batch. Steps that validate properties on
    /// close are skipped when a property of their process is invalid.
    pub fn close_all(&mut self, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let now_text = Utc::now().to_rfc3339();
        let steps = self.steps.clone();
        for step in &steps {
            let process_title = self.process_title(step.process_id).to_string();
            if step.validate_on_close && !self.process_properties_valid(step)? {
                log.error(
                    self.catalog
                        .resolve_with("batchCloseBlocked", &[&process_title]),
                );
                continue;
            }

            let mut closed = step.clone();
            closed.status = StepStatus::Done.value();
            closed.edit_type = StepEditType::ManualMulti.value();
            closed.finished_at = Some(now_text.clone());
            closed.edited_at = Some(now_text.clone());
            step_repo::update(&self.db, &closed)?;
            history_repo::insert(
                &self.db,
                step.process_id,
                HistoryKind::StepDone,
                Some(step.sequence as f64),
                Some(&step.title),
                &now_text,
            )?;
            log.info(self.catalog.resolve_with("batchClosed", &[&process_title]));
        }
        self.refresh_steps()
    }

    fn process_properties_valid(&self, step: &StepRow) -> Result<bool, WorkflowError> {
        let props = properties::load_process_properties(
            &self.db,
            step.process_id,
            &self.templates,
            Some(&step.title),
        )?;
        Ok(props.iter().all(ProcessProperty::is_valid))
    }

    // ── process log ──

    /// Appends a note to the log of the current process.
    pub fn add_to_wiki(&mut self, message: &str, log: &mut MessageLog) -> Result<(), WorkflowError> {
        let process_id = self.current_step().process_id;
        self.append_wiki(process_id, WikiKind::User, message)?;
        log.info(
            self.catalog
                .resolve_with("wikiEntryAdded", &[self.process_title(process_id)]),
        );
        Ok(())
    }

    /// Appends the same note to the log of every process in the batch.
    pub fn add_to_wiki_for_all(
        &mut self,
        message: &str,
        log: &mut MessageLog,
    ) -> Result<(), WorkflowError> {
        let process_ids: Vec<i64> = self.steps.iter().map(|s| s.process_id).collect();
        for process_id in process_ids {
            self.append_wiki(process_id, WikiKind::User, message)?;
            log.info(
                self.catalog
                    .resolve_with("wikiEntryAdded", &[self.process_title(process_id)]),
            );
        }
        Ok(())
    }

    fn append_wiki(
        &self,
        process_id: i64,
        kind: WikiKind,
        message: &str,
    ) -> Result<(), WorkflowError> {
        let process = process_repo::find_by_id(&self.db, process_id)?
            .ok_or_else(|| WorkflowError::ProcessNotFound(process_id.to_string()))?;
        let updated = wiki::append_entry(&process.wiki_log, kind, message, Utc::now());
        process_repo::update_wiki_log(&self.db, process_id, &updated)?;
        Ok(())
    }

    /// Re-reads all batch steps from the database after bulk updates.
    fn refresh_steps(&mut self) -> Result<(), WorkflowError> {
        for step in &mut self.steps {
            if let Some(fresh) = step_repo::find_by_id(&self.db, step.id)? {
                *step = fresh;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::step_repo::NewStep;
    use regex::Regex;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn seed_process_with_steps(db: &Database, title: &str, steps: &[(&str, i64, i64)]) -> i64 {
        let pid = process_repo::insert(db, title, None, None, "2026-01-01T00:00:00Z").unwrap();
        for (step_title, sequence, status) in steps {
            step_repo::insert(
                db,
                &NewStep {
                    process_id: pid,
                    title: step_title.to_string(),
                    sequence: *sequence,
                    status: *status,
                    ..Default::default()
                },
            )
            .unwrap();
        }
        pid
    }

    fn batch_for(db: &Database, process_ids: &[i64], step_title: &str) -> BatchSession {
        let steps: Vec<StepRow> = process_ids
            .iter()
            .map(|pid| step_repo::find_by_title(db, *pid, step_title).unwrap().unwrap())
            .collect();
        BatchSession::new(db.clone(), MessageCatalog::load("en"), Vec::new(), steps).unwrap()
    }

    // ── construction ──

    #[test]
    fn test_empty_batch_rejected() {
        let db = test_db();
        let result = BatchSession::new(
            db,
            MessageCatalog::load("en"),
            Vec::new(),
            Vec::new(),
        );
        assert!(matches!(result, Err(WorkflowError::EmptyBatch)));
    }

    // ── property saving ──

    #[test]
    fn test_save_container_aborts_on_invalid_property() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        let templates = vec![PropertyTemplate {
            name: "Year".to_string(),
            required: false,
            pattern: Some(Regex::new(r"^\d{4}$").unwrap()),
            steps: Vec::new(),
        }];
        let step = step_repo::find_by_title(&db, pid, "QC").unwrap().unwrap();
        let mut session = BatchSession::new(
            db.clone(),
            MessageCatalog::load("en"),
            templates,
            vec![step],
        )
        .unwrap();

        for p in session.properties_mut() {
            if p.name == "Year" {
                p.value = "not a year".to_string();
            }
        }
        let mut log = MessageLog::new();
        session.save_container(0, &mut log).unwrap();

        assert!(log.has_errors());
        let rows = property_repo::list_for_process(&db, pid).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_save_container_updates_existing_row() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        property_repo::insert(&db, pid, Some("Shelfmark"), "old", 0, "2026-01-01T00:00:00Z")
            .unwrap();
        let mut session = batch_for(&db, &[pid], "QC");

        for p in session.properties_mut() {
            if p.name == "Shelfmark" {
                p.value = "new".to_string();
            }
        }
        let mut log = MessageLog::new();
        session.save_container(0, &mut log).unwrap();

        let rows = property_repo::list_for_process(&db, pid).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "new");
        assert!(!log.has_errors());
    }

    #[test]
    fn test_save_container_renames_in_place() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        property_repo::insert(&db, pid, Some("Autor"), "Mustermann", 0, "2026-01-01T00:00:00Z")
            .unwrap();
        let mut session = batch_for(&db, &[pid], "QC");

        for p in session.properties_mut() {
            if p.name == "Autor" {
                p.name = "Author".to_string();
            }
        }
        let mut log = MessageLog::new();
        session.save_container(0, &mut log).unwrap();

        // The loaded row keeps its identity, no orphan under the old name.
        let rows = property_repo::list_for_process(&db, pid).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("Author"));
        assert_eq!(rows[0].value, "Mustermann");
        assert!(!log.has_errors());
    }

    #[test]
    fn test_save_container_purges_untitled_rows() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        property_repo::insert(&db, pid, None, "", 0, "2026-01-01T00:00:00Z").unwrap();
        property_repo::insert(&db, pid, Some("Keep"), "v", 0, "2026-01-01T00:00:00Z").unwrap();
        let mut session = batch_for(&db, &[pid], "QC");

        let mut log = MessageLog::new();
        session.save_container(0, &mut log).unwrap();

        let rows = property_repo::list_for_process(&db, pid).unwrap();
        assert!(rows.iter().all(|r| r.title.is_some()));
    }

    #[test]
    fn test_save_container_for_all_writes_each_process() {
        let db = test_db();
        let p1 = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        let p2 = seed_process_with_steps(&db, "p2", &[("QC", 2, 2)]);
        property_repo::insert(&db, p1, Some("Shelfmark"), "a", 0, "2026-01-01T00:00:00Z")
            .unwrap();
        let mut session = batch_for(&db, &[p1, p2], "QC");

        for p in session.properties_mut() {
            if p.name == "Shelfmark" {
                p.value = "shared".to_string();
            }
        }
        let mut log = MessageLog::new();
        session.save_container_for_all(0, &mut log).unwrap();

        for pid in [p1, p2] {
            let rows = property_repo::list_for_process(&db, pid).unwrap();
            assert_eq!(rows.len(), 1, "process {}", pid);
            assert_eq!(rows[0].value, "shared");
        }
    }

    // ── container duplication ──

    #[test]
    fn test_duplicate_container_picks_smallest_unused_id() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        property_repo::insert(&db, pid, Some("a"), "1", 1, "2026-01-01T00:00:00Z").unwrap();
        property_repo::insert(&db, pid, Some("b"), "2", 1, "2026-01-01T00:00:00Z").unwrap();
        property_repo::insert(&db, pid, Some("c"), "3", 3, "2026-01-01T00:00:00Z").unwrap();
        let mut session = batch_for(&db, &[pid], "QC");

        let mut log = MessageLog::new();
        session.duplicate_container(1, &mut log).unwrap();

        let rows = property_repo::list_for_process(&db, pid).unwrap();
        let in_two: Vec<&str> = rows
            .iter()
            .filter(|r| r.container == 2)
            .filter_map(|r| r.title.as_deref())
            .collect();
        assert_eq!(in_two, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_container_zero_rejected() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        property_repo::insert(&db, pid, Some("a"), "1", 0, "2026-01-01T00:00:00Z").unwrap();
        let mut session = batch_for(&db, &[pid], "QC");

        let mut log = MessageLog::new();
        session.duplicate_container(0, &mut log).unwrap();

        assert!(log.has_errors());
        let rows = property_repo::list_for_process(&db, pid).unwrap();
        assert_eq!(rows.len(), 1);
    }

    // ── corrections ──

    #[test]
    fn test_report_problem_reshapes_step_statuses() {
        let db = test_db();
        let pid = seed_process_with_steps(
            &db,
            "p1",
            &[("Scanning", 1, 3), ("Metadata", 2, 3), ("QC", 3, 2), ("Export", 4, 0)],
        );
        let mut session = batch_for(&db, &[pid], "QC");
        session.problem_step = Some("Scanning".to_string());
        session.problem_message = "page 12 blurry".to_string();

        let mut log = MessageLog::new();
        session.report_problem(&mut log).unwrap();

        let by_title = |t: &str| step_repo::find_by_title(&db, pid, t).unwrap().unwrap();
        let scanning = by_title("Scanning");
        assert_eq!(scanning.status, StepStatus::Open.value());
        assert!(scanning.correction);
        assert!(scanning.started_at.is_none());

        let metadata = by_title("Metadata");
        assert_eq!(metadata.status, StepStatus::Locked.value());
        assert!(metadata.correction);

        let qc = by_title("QC");
        assert_eq!(qc.status, StepStatus::Locked.value());

        // Later steps are untouched.
        let export = by_title("Export");
        assert_eq!(export.status, StepStatus::Locked.value());
        assert!(!export.correction);

        let process = process_repo::find_by_id(&db, pid).unwrap().unwrap();
        assert!(process.wiki_log.contains("error"));
        assert!(process.wiki_log.contains("page 12 blurry"));

        let history = history_repo::list_for_process(&db, pid).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, HistoryKind::StepError.value());
        assert_eq!(history[0].text_value.as_deref(), Some("Scanning"));
    }

    #[test]
    fn test_report_problem_without_selection_errors() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("Scanning", 1, 3), ("QC", 2, 2)]);
        let mut session = batch_for(&db, &[pid], "QC");

        let mut log = MessageLog::new();
        let result = session.report_problem(&mut log);
        assert!(matches!(result, Err(WorkflowError::NoStepSelected)));
    }

    #[test]
    fn test_solve_problem_closes_span_and_reopens_solution() {
        let db = test_db();
        // Scanning reported a problem to it earlier; now the correction
        // step (Scanning) forwards the solution to QC.
        let pid = seed_process_with_steps(
            &db,
            "p1",
            &[("Scanning", 1, 1), ("Metadata", 2, 0), ("QC", 3, 0)],
        );
        let mut session = batch_for(&db, &[pid], "Scanning");
        session.solution_step = Some("QC".to_string());
        session.solution_message = "rescanned".to_string();

        let mut log = MessageLog::new();
        session.solve_problem(&mut log).unwrap();

        let by_title = |t: &str| step_repo::find_by_title(&db, pid, t).unwrap().unwrap();
        assert_eq!(by_title("Scanning").status, StepStatus::Done.value());
        assert_eq!(by_title("Metadata").status, StepStatus::Done.value());

        let qc = by_title("QC");
        assert_eq!(qc.status, StepStatus::Open.value());
        assert!(qc.correction);

        let process = process_repo::find_by_id(&db, pid).unwrap().unwrap();
        assert!(process.wiki_log.contains("info"));
        assert!(process.wiki_log.contains("rescanned"));
    }

    #[test]
    fn test_report_problem_for_all_continues_after_missing_step() {
        let db = test_db();
        let p1 = seed_process_with_steps(&db, "p1", &[("Scanning", 1, 3), ("QC", 2, 2)]);
        // p2 has no Scanning step, its report must fail without
        // stopping p1 from being handled.
        let p2 = seed_process_with_steps(&db, "p2", &[("Other", 1, 3), ("QC", 2, 2)]);
        let mut session = batch_for(&db, &[p2, p1], "QC");
        session.problem_step = Some("Scanning".to_string());
        session.problem_message = "broken".to_string();

        let mut log = MessageLog::new();
        session.report_problem_for_all(&mut log).unwrap();

        assert!(log.has_errors());
        let scanning = step_repo::find_by_title(&db, p1, "Scanning").unwrap().unwrap();
        assert_eq!(scanning.status, StepStatus::Open.value());
        let other = step_repo::find_by_title(&db, p2, "Other").unwrap().unwrap();
        assert_eq!(other.status, StepStatus::Done.value());
    }

    // ── batch lifecycle ──

    #[test]
    fn test_return_all_reopens_steps() {
        let db = test_db();
        let p1 = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        let p2 = seed_process_with_steps(&db, "p2", &[("QC", 2, 2)]);
        let mut session = batch_for(&db, &[p1, p2], "QC");

        let mut log = MessageLog::new();
        session.return_all(&mut log).unwrap();

        for pid in [p1, p2] {
            let qc = step_repo::find_by_title(&db, pid, "QC").unwrap().unwrap();
            assert_eq!(qc.status, StepStatus::Open.value());
            assert_eq!(qc.edit_type, StepEditType::ManualMulti.value());
        }
    }

    #[test]
    fn test_close_all_marks_done_and_records_history() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        let mut session = batch_for(&db, &[pid], "QC");

        let mut log = MessageLog::new();
        session.close_all(&mut log).unwrap();

        let qc = step_repo::find_by_title(&db, pid, "QC").unwrap().unwrap();
        assert_eq!(qc.status, StepStatus::Done.value());
        assert!(qc.finished_at.is_some());

        let history = history_repo::list_for_process(&db, pid).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, HistoryKind::StepDone.value());
    }

    #[test]
    fn test_close_all_skips_process_with_invalid_properties() {
        let db = test_db();
        let pid = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        // Flag the step to validate on close.
        let mut step = step_repo::find_by_title(&db, pid, "QC").unwrap().unwrap();
        step.validate_on_close = true;
        step_repo::update(&db, &step).unwrap();

        let templates = vec![PropertyTemplate {
            name: "Shelfmark".to_string(),
            required: true,
            pattern: None,
            steps: Vec::new(),
        }];
        let mut session = BatchSession::new(
            db.clone(),
            MessageCatalog::load("en"),
            templates,
            vec![step],
        )
        .unwrap();

        let mut log = MessageLog::new();
        session.close_all(&mut log).unwrap();

        assert!(log.has_errors());
        let qc = step_repo::find_by_title(&db, pid, "QC").unwrap().unwrap();
        assert_eq!(qc.status, StepStatus::InWork.value());
    }

    // ── process log ──

    #[test]
    fn test_add_to_wiki_for_all() {
        let db = test_db();
        let p1 = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        let p2 = seed_process_with_steps(&db, "p2", &[("QC", 2, 2)]);
        let mut session = batch_for(&db, &[p1, p2], "QC");

        let mut log = MessageLog::new();
        session.add_to_wiki_for_all("batch note", &mut log).unwrap();

        for pid in [p1, p2] {
            let process = process_repo::find_by_id(&db, pid).unwrap().unwrap();
            assert!(process.wiki_log.contains("user - batch note"));
        }
    }

    #[test]
    fn test_set_current_by_process_title() {
        let db = test_db();
        let p1 = seed_process_with_steps(&db, "p1", &[("QC", 2, 2)]);
        let p2 = seed_process_with_steps(&db, "p2", &[("QC", 2, 2)]);
        property_repo::insert(&db, p2, Some("Only2"), "x", 0, "2026-01-01T00:00:00Z").unwrap();
        let mut session = batch_for(&db, &[p1, p2], "QC");

        session.set_current_by_process_title("p2").unwrap();
        assert_eq!(session.current_step().process_id, p2);
        assert!(session.properties().iter().any(|p| p.name == "Only2"));

        assert!(session.set_current_by_process_title("missing").is_err());
    }
}
