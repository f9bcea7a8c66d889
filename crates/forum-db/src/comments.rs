use anyhow::Result;
use rusqlite::Row;

use crate::models::CommentRow;
use crate::{Database, OptionalExt};

const COMMENT_SELECT: &str = "
    SELECT c.id, c.post_id, c.parent_id, c.author_id, u.username, c.content,
           c.is_approved, c.created_at, c.updated_at
    FROM comments c
    LEFT JOIN users u ON c.author_id = u.id";

impl Database {
    pub fn insert_comment(
        &self,
        post_id: i64,
        parent_id: Option<i64>,
        author_id: i64,
        content: &str,
        approved: bool,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, parent_id, author_id, content, is_approved)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![post_id, parent_id, author_id, content, approved],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE c.id = ?1", COMMENT_SELECT);
            let row = conn.query_row(&sql, [id], map_comment).optional()?;
            Ok(row)
        })
    }

    /// Approved comments of one post in thread order: grouped by root id,
    /// roots before their replies, then oldest first.
    pub fn get_thread_comments(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE c.post_id = ?1 AND c.is_approved = 1
                 ORDER BY COALESCE(c.parent_id, c.id), c.parent_id, c.created_at, c.id",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([post_id], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Moderation queue, oldest first.
    pub fn list_pending_comments(&self) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE c.is_approved = 0 ORDER BY c.created_at, c.id",
                COMMENT_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_comment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_comment_content(&self, id: i64, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?2, updated_at = datetime('now') WHERE id = ?1",
                rusqlite::params![id, content],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_comment_approval(&self, id: i64, approved: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET is_approved = ?2 WHERE id = ?1",
                rusqlite::params![id, approved],
            )?;
            Ok(changed > 0)
        })
    }

    /// Permanently delete a comment. Replies cascade via the parent_id FK.
    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_id: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| "unknown".to_string()),
        content: row.get(5)?,
        is_approved: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
