use anyhow::Result;

use crate::Database;
use crate::models::{NewNotification, NotificationRow};

impl Database {
    pub fn insert_notification(&self, n: &NewNotification<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (user_id, category, title, body, related_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![n.user_id, n.category, n.title, n.body, n.related_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first.
    pub fn list_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, category, title, body, related_id, is_read, created_at
                 FROM notifications
                 WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, unread_only], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        category: row.get(2)?,
                        title: row.get(3)?,
                        body: row.get(4)?,
                        related_id: row.get(5)?,
                        is_read: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark one of the user's notifications read. False if it is not theirs or missing.
    pub fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(changed > 0)
        })
    }
}
