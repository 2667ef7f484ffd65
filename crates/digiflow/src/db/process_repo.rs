//! Process repository — CRUD operations for the `processes` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw process row from the database.
#[derive(Debug, Clone)]
pub struct ProcessRow {
    pub id: i64,
    pub title: String,
    pub ruleset_id: Option<i64>,
    pub project_id: Option<i64>,
    pub wiki_log: String,
    pub is_template: bool,
    pub created_at: String,
}

impl ProcessRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            ruleset_id: row.get("ruleset_id")?,
            project_id: row.get("project_id")?,
            wiki_log: row.get("wiki_log")?,
            is_template: row.get("is_template")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a new process and returns its generated id.
pub fn insert(
    db: &Database,
    title: &str,
    ruleset_id: Option<i64>,
    project_id: Option<i64>,
    created_at: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO processes (title, ruleset_id, project_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![title, ruleset_id, project_id, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a process by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ProcessRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM processes WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ProcessRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all processes ordered by title.
pub fn list_all(db: &Database) -> Result<Vec<ProcessRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM processes ORDER BY title")?;
        let rows: Vec<ProcessRow> = stmt
            .query_map([], ProcessRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Overwrites the wiki log of a process.
pub fn update_wiki_log(db: &Database, id: i64, wiki_log: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE processes SET wiki_log = ?2 WHERE id = ?1",
            params![id, wiki_log],
        )?;
        Ok(())
    })
}

/// Assigns a ruleset to a process.
pub fn set_ruleset(db: &Database, id: i64, ruleset_id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE processes SET ruleset_id = ?2 WHERE id = ?1",
            params![id, ruleset_id],
        )?;
        Ok(())
    })
}

/// Deletes a process. Steps, properties and history rows cascade.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM processes WHERE id = ?1", params![id])?;
        Ok(())
    })
}
