//! Property repository — CRUD operations for the `properties` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw process property row from the database.
///
/// A `title` of NULL marks a property that was created but never named;
/// such rows are purged before saves.
#[derive(Debug, Clone)]
pub struct PropertyRow {
    pub id: i64,
    pub process_id: i64,
    pub title: Option<String>,
    pub value: String,
    pub container: i64,
    pub created_at: String,
}

impl PropertyRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            process_id: row.get("process_id")?,
            title: row.get("title")?,
            value: row.get("value")?,
            container: row.get("container")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a new property and returns its generated id.
pub fn insert(
    db: &Database,
    process_id: i64,
    title: Option<&str>,
    value: &str,
    container: i64,
    created_at: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO properties (process_id, title, value, container, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![process_id, title, value, container, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Updates the value of an existing property.
pub fn update_value(db: &Database, id: i64, value: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE properties SET value = ?2 WHERE id = ?1",
            params![id, value],
        )?;
        Ok(())
    })
}

/// Updates the title and value of an existing property.
pub fn update_title_and_value(
    db: &Database,
    id: i64,
    title: &str,
    value: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE properties SET title = ?2, value = ?3 WHERE id = ?1",
            params![id, title, value],
        )?;
        Ok(())
    })
}

/// Lists all properties of a process ordered by container then title.
pub fn list_for_process(db: &Database, process_id: i64) -> Result<Vec<PropertyRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM properties WHERE process_id = ?1 ORDER BY container, title",
        )?;
        let rows: Vec<PropertyRow> = stmt
            .query_map(params![process_id], PropertyRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Finds a property of a process by title and container.
pub fn find_by_title_and_container(
    db: &Database,
    process_id: i64,
    title: &str,
    container: i64,
) -> Result<Option<PropertyRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM properties WHERE process_id = ?1 AND title = ?2 AND container = ?3",
        )?;
        let mut rows = stmt.query_map(params![process_id, title, container], PropertyRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Deletes a property.
pub fn delete(db: &Database, id: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM properties WHERE id = ?1", params![id])?;
        Ok(())
    })
}

/// Deletes all untitled properties of a process. Returns the number removed.
pub fn delete_untitled(db: &Database, process_id: i64) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM properties WHERE process_id = ?1 AND title IS NULL",
            params![process_id],
        )?;
        Ok(n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::process_repo;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn seed_process(db: &Database) -> i64 {
        process_repo::insert(db, "prop_process", None, None, "2026-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn test_insert_and_list() {
        let db = test_db();
        let pid = seed_process(&db);
        insert(&db, pid, Some("Shelfmark"), "Ms 42", 0, "2026-01-01T00:00:00Z").unwrap();
        insert(&db, pid, Some("Author"), "Anon", 1, "2026-01-01T00:00:00Z").unwrap();

        let rows = list_for_process(&db, pid).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title.as_deref(), Some("Shelfmark"));
        assert_eq!(rows[1].container, 1);
    }

    #[test]
    fn test_update_value() {
        let db = test_db();
        let pid = seed_process(&db);
        let id = insert(&db, pid, Some("Shelfmark"), "old", 0, "2026-01-01T00:00:00Z").unwrap();

        update_value(&db, id, "new").unwrap();
        let rows = list_for_process(&db, pid).unwrap();
        assert_eq!(rows[0].value, "new");
    }

    #[test]
    fn test_find_by_title_and_container() {
        let db = test_db();
        let pid = seed_process(&db);
        insert(&db, pid, Some("Author"), "A", 1, "2026-01-01T00:00:00Z").unwrap();
        insert(&db, pid, Some("Author"), "B", 2, "2026-01-01T00:00:00Z").unwrap();

        let found = find_by_title_and_container(&db, pid, "Author", 2)
            .unwrap()
            .unwrap();
        assert_eq!(found.value, "B");
        assert!(find_by_title_and_container(&db, pid, "Author", 3)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_untitled() {
        let db = test_db();
        let pid = seed_process(&db);
        insert(&db, pid, None, "", 0, "2026-01-01T00:00:00Z").unwrap();
        insert(&db, pid, None, "", 0, "2026-01-01T00:00:00Z").unwrap();
        insert(&db, pid, Some("Keep"), "v", 0, "2026-01-01T00:00:00Z").unwrap();

        let removed = delete_untitled(&db, pid).unwrap();
        assert_eq!(removed, 2);

        let rows = list_for_process(&db, pid).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("Keep"));
    }
}
