use anyhow::Result;
use rusqlite::{Connection, Row};

use crate::models::UserRow;
use crate::{Database, OptionalExt};

impl Database {
    /// Insert a user and return the new id.
    pub fn create_user(&self, username: &str, password_hash: &str, role: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, role) VALUES (?1, ?2, ?3)",
                (username, password_hash, role),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }
}

fn query_user(
    conn: &Connection,
    predicate: &str,
    value: impl rusqlite::ToSql,
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password, role, created_at FROM users WHERE {}",
        predicate
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_user("alice", "hash", "user").unwrap();

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_name.role, "user");

        let by_id = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(db.user_exists(id).unwrap());
        assert!(!db.user_exists(id + 100).unwrap());
        assert!(db.get_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash", "user").unwrap();
        let err = db.create_user("alice", "other", "user").unwrap_err();
        assert!(crate::is_unique_violation(&err));

        let err = db.create_user("bob", "hash", "superuser").unwrap_err();
        assert!(!crate::is_unique_violation(&err));
    }
}
