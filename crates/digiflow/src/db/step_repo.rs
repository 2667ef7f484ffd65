//! Step repository — CRUD operations for the `steps` table.

use std::collections::BTreeMap;

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw workflow step row from the database.
#[derive(Debug, Clone)]
pub struct StepRow {
    pub id: i64,
    pub process_id: i64,
    pub title: String,
    pub sequence: i64,
    pub status: i64,
    pub priority: i64,
    pub correction: bool,
    pub edit_type: i64,
    pub assigned_user_id: Option<i64>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub edited_at: Option<String>,
    pub automatic: bool,
    pub script_step: bool,
    pub batch_step: bool,
    pub validate_on_close: bool,
    pub writes_images: bool,
    pub reads_images: bool,
    pub metadata_step: bool,
    pub export_step: bool,
    pub module_name: Option<String>,
    pub script_name1: Option<String>,
    pub script_path1: Option<String>,
    pub script_name2: Option<String>,
    pub script_path2: Option<String>,
    pub script_name3: Option<String>,
    pub script_path3: Option<String>,
    pub script_name4: Option<String>,
    pub script_path4: Option<String>,
    pub script_name5: Option<String>,
    pub script_path5: Option<String>,
}

impl StepRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            process_id: row.get("process_id")?,
            title: row.get("title")?,
            sequence: row.get("sequence")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            correction: row.get("correction")?,
            edit_type: row.get("edit_type")?,
            assigned_user_id: row.get("assigned_user_id")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            edited_at: row.get("edited_at")?,
            automatic: row.get("automatic")?,
            script_step: row.get("script_step")?,
            batch_step: row.get("batch_step")?,
            validate_on_close: row.get("validate_on_close")?,
            writes_images: row.get("writes_images")?,
            reads_images: row.get("reads_images")?,
            metadata_step: row.get("metadata_step")?,
            export_step: row.get("export_step")?,
            module_name: row.get("module_name")?,
            script_name1: row.get("script_name1")?,
            script_path1: row.get("script_path1")?,
            script_name2: row.get("script_name2")?,
            script_path2: row.get("script_path2")?,
            script_name3: row.get("script_name3")?,
            script_path3: row.get("script_path3")?,
            script_name4: row.get("script_name4")?,
            script_path4: row.get("script_path4")?,
            script_name5: row.get("script_name5")?,
            script_path5: row.get("script_path5")?,
        })
    }

    /// Collects the five script slots into a name -> path map, skipping
    /// slots where either side is missing or empty.
    pub fn scripts(&self) -> BTreeMap<String, String> {
        let slots = [
            (&self.script_name1, &self.script_path1),
            (&self.script_name2, &self.script_path2),
            (&self.script_name3, &self.script_path3),
            (&self.script_name4, &self.script_path4),
            (&self.script_name5, &self.script_path5),
        ];
        let mut map = BTreeMap::new();
        for (name, path) in slots {
            if let (Some(name), Some(path)) = (name, path) {
                if !name.is_empty() && !path.is_empty() {
                    map.insert(name.clone(), path.clone());
                }
            }
        }
        map
    }
}

/// Parameters for creating a new step. Flags default to off.
#[derive(Debug, Default, Clone)]
pub struct NewStep {
    pub process_id: i64,
    pub title: String,
    pub sequence: i64,
    pub status: i64,
    pub priority: i64,
    pub automatic: bool,
}

/// Inserts a new step and returns its generated id.
pub fn insert(db: &Database, step: &NewStep) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO steps (process_id, title, sequence, status, priority, automatic)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                step.process_id,
                step.title,
                step.sequence,
                step.status,
                step.priority,
                step.automatic,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a step by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<StepRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM steps WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], StepRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Finds a step of a process by its title.
pub fn find_by_title(
    db: &Database,
    process_id: i64,
    title: &str,
) -> Result<Option<StepRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM steps WHERE process_id = ?1 AND title = ?2")?;
        let mut rows = stmt.query_map(params![process_id, title], StepRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all steps of a process ordered by sequence.
pub fn list_for_process(db: &Database, process_id: i64) -> Result<Vec<StepRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM steps WHERE process_id = ?1 ORDER BY sequence")?;
        let rows: Vec<StepRow> = stmt
            .query_map(params![process_id], StepRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists steps of a process with `lower < sequence <= upper`, ordered by
/// sequence ascending.
pub fn list_between(
    db: &Database,
    process_id: i64,
    lower_exclusive: i64,
    upper_inclusive: i64,
) -> Result<Vec<StepRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM steps WHERE process_id = ?1 AND sequence > ?2 AND sequence <= ?3
             ORDER BY sequence",
        )?;
        let rows: Vec<StepRow> = stmt
            .query_map(
                params![process_id, lower_exclusive, upper_inclusive],
                StepRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists steps of a process with `lower <= sequence <= upper`, ordered by
/// sequence ascending.
pub fn list_span(
    db: &Database,
    process_id: i64,
    lower_inclusive: i64,
    upper_inclusive: i64,
) -> Result<Vec<StepRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM steps WHERE process_id = ?1 AND sequence >= ?2 AND sequence <= ?3
             ORDER BY sequence",
        )?;
        let rows: Vec<StepRow> = stmt
            .query_map(
                params![process_id, lower_inclusive, upper_inclusive],
                StepRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists steps of a process with sequence strictly below the given bound,
/// ordered by sequence descending.
pub fn list_before(
    db: &Database,
    process_id: i64,
    sequence: i64,
) -> Result<Vec<StepRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM steps WHERE process_id = ?1 AND sequence < ?2
             ORDER BY sequence DESC",
        )?;
        let rows: Vec<StepRow> = stmt
            .query_map(params![process_id, sequence], StepRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Overwrites all mutable fields of a step.
pub fn update(db: &Database, step: &StepRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE steps SET title=?2, sequence=?3, status=?4, priority=?5, correction=?6,
             edit_type=?7, assigned_user_id=?8, started_at=?9, finished_at=?10, edited_at=?11,
             automatic=?12, script_step=?13, batch_step=?14, validate_on_close=?15,
             writes_images=?16, reads_images=?17, metadata_step=?18, export_step=?19,
             module_name=?20, script_name1=?21, script_path1=?22, script_name2=?23,
             script_path2=?24, script_name3=?25, script_path3=?26, script_name4=?27,
             script_path4=?28, script_name5=?29, script_path5=?30
             WHERE id=?1",
            params![
                step.id,
                step.title,
                step.sequence,
                step.status,
                step.priority,
                step.correction,
                step.edit_type,
                step.assigned_user_id,
                step.started_at,
                step.finished_at,
                step.edited_at,
                step.automatic,
                step.script_step,
                step.batch_step,
                step.validate_on_close,
                step.writes_images,
                step.reads_images,
                step.metadata_step,
                step.export_step,
                step.module_name,
                step.script_name1,
                step.script_path1,
                step.script_name2,
                step.script_path2,
                step.script_name3,
                step.script_path3,
                step.script_name4,
                step.script_path4,
                step.script_name5,
                step.script_path5,
            ],
        )?;
        Ok(())
    })
}

/// Updates only the status of a step.
pub fn update_status(db: &Database, id: i64, status: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE steps SET status = ?2 WHERE id = ?1",
            params![id, status],
        )?;
        Ok(())
    })
}

/// Updates only the sequence number of a step.
pub fn update_sequence(db: &Database, id: i64, sequence: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE steps SET sequence = ?2 WHERE id = ?1",
            params![id, sequence],
        )?;
        Ok(())
    })
}

/// Deletes a step.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM steps WHERE id = ?1", params![id])?;
        Ok(())
    })
}

/// Assigns a user to a step. Already-assigned users are ignored.
pub fn assign_user(db: &Database, step_id: i64, user_id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO step_users (step_id, user_id) VALUES (?1, ?2)",
            params![step_id, user_id],
        )?;
        Ok(())
    })
}

/// Lists the ids of users assigned to a step.
pub fn list_assigned_users(db: &Database, step_id: i64) -> Result<Vec<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT user_id FROM step_users WHERE step_id = ?1 ORDER BY user_id")?;
        let rows: Vec<i64> = stmt
            .query_map(params![step_id], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
