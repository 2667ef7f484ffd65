//! User repository — CRUD operations for the `users` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw user row from the database.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub login: String,
    pub full_name: String,
    pub group_name: Option<String>,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            login: row.get("login")?,
            full_name: row.get("full_name")?,
            group_name: row.get("group_name")?,
        })
    }
}

/// Inserts a new user and returns its generated id.
pub fn insert(
    db: &Database,
    login: &str,
    full_name: &str,
    group_name: Option<&str>,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO users (login, full_name, group_name) VALUES (?1, ?2, ?3)",
            params![login, full_name, group_name],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a user by login name.
pub fn find_by_login(db: &Database, login: &str) -> Result<Option<UserRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE login = ?1")?;
        let mut rows = stmt.query_map(params![login], UserRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all users belonging to a group, ordered by login.
pub fn list_by_group(db: &Database, group_name: &str) -> Result<Vec<UserRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM users WHERE group_name = ?1 ORDER BY login")?;
        let rows: Vec<UserRow> = stmt
            .query_map(params![group_name], UserRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_insert_and_find_by_login() {
        let db = test_db();
        insert(&db, "jdoe", "J. Doe", Some("scanning")).unwrap();

        let found = find_by_login(&db, "jdoe").unwrap().unwrap();
        assert_eq!(found.full_name, "J. Doe");
        assert_eq!(found.group_name.as_deref(), Some("scanning"));
        assert!(find_by_login(&db, "missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_login_rejected() {
        let db = test_db();
        insert(&db, "jdoe", "J. Doe", None).unwrap();
        assert!(insert(&db, "jdoe", "Other", None).is_err());
    }

    #[test]
    fn test_list_by_group() {
        let db = test_db();
        insert(&db, "bob", "Bob", Some("qc")).unwrap();
        insert(&db, "alice", "Alice", Some("qc")).unwrap();
        insert(&db, "carol", "Carol", Some("scanning")).unwrap();

        let members = list_by_group(&db, "qc").unwrap();
        let logins: Vec<&str> = members.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, vec!["alice", "bob"]);
    }
}
