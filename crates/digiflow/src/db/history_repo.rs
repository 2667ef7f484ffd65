//! History repository — append-only event log per process.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// Kind of a recorded history event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    StepError,
    StepOpen,
    StepDone,
}

impl HistoryKind {
    pub fn value(self) -> i64 {
        match self {
            HistoryKind::StepError => 1,
            HistoryKind::StepOpen => 2,
            HistoryKind::StepDone => 3,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(HistoryKind::StepError),
            2 => Some(HistoryKind::StepOpen),
            3 => Some(HistoryKind::StepDone),
            _ => None,
        }
    }
}

/// A raw history row from the database.
#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub id: i64,
    pub process_id: i64,
    pub kind: i64,
    pub numeric_value: Option<f64>,
    pub text_value: Option<String>,
    pub recorded_at: String,
}

impl HistoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            process_id: row.get("process_id")?,
            kind: row.get("kind")?,
            numeric_value: row.get("numeric_value")?,
            text_value: row.get("text_value")?,
            recorded_at: row.get("recorded_at")?,
        })
    }
}

/// Records a history event for a process.
pub fn insert(
    db: &Database,
    process_id: i64,
    kind: HistoryKind,
    numeric_value: Option<f64>,
    text_value: Option<&str>,
    recorded_at: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO history (process_id, kind, numeric_value, text_value, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![process_id, kind.value(), numeric_value, text_value, recorded_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Lists all history events of a process in insertion order.
pub fn list_for_process(db: &Database, process_id: i64) -> Result<Vec<HistoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM history WHERE process_id = ?1 ORDER BY id")?;
        let rows: Vec<HistoryRow> = stmt
            .query_map(params![process_id], HistoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
