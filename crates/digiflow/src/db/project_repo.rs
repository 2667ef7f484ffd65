//! Project and ruleset repositories.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw project row from the database.
#[derive(Debug, Clone)]
pub struct ProjectRow {
    pub id: i64,
    pub title: String,
    pub dms_export_root: Option<String>,
}

impl ProjectRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            dms_export_root: row.get("dms_export_root")?,
        })
    }
}

/// A raw ruleset row from the database.
#[derive(Debug, Clone)]
pub struct RulesetRow {
    pub id: i64,
    pub title: String,
    pub file: String,
}

impl RulesetRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            file: row.get("file")?,
        })
    }
}

/// Inserts a new project and returns its generated id.
pub fn insert_project(
    db: &Database,
    title: &str,
    dms_export_root: Option<&str>,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO projects (title, dms_export_root) VALUES (?1, ?2)",
            params![title, dms_export_root],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a project by its id.
pub fn find_project_by_id(db: &Database, id: i64) -> Result<Option<ProjectRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM projects WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ProjectRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Inserts a new ruleset and returns its generated id.
pub fn insert_ruleset(db: &Database, title: &str, file: &str) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO rulesets (title, file) VALUES (?1, ?2)",
            params![title, file],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a ruleset by its title.
pub fn find_ruleset_by_title(
    db: &Database,
    title: &str,
) -> Result<Option<RulesetRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM rulesets WHERE title = ?1")?;
        let mut rows = stmt.query_map(params![title], RulesetRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}
