use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE categories (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL UNIQUE,
                slug    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE posts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                kind        TEXT NOT NULL CHECK (kind IN ('article', 'document')),
                title       TEXT NOT NULL,
                body        TEXT NOT NULL,
                author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT
            );

            CREATE INDEX idx_posts_kind_created ON posts(kind, created_at);

            CREATE TABLE tags (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE post_tags (
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                tag_id  INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (post_id, tag_id)
            );

            CREATE TABLE comments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                parent_id   INTEGER REFERENCES comments(id) ON DELETE CASCADE,
                author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                is_approved INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT
            );

            CREATE INDEX idx_comments_thread ON comments(post_id, parent_id, created_at);

            CREATE TABLE bookmarks (
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (user_id, post_id)
            );

            CREATE TABLE reports (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                reporter_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                report_type     TEXT NOT NULL CHECK (report_type IN ('user', 'post', 'document')),
                target_id       INTEGER NOT NULL,
                reason          TEXT NOT NULL,
                details         TEXT,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'reviewed', 'resolved', 'dismissed')),
                is_false_report INTEGER NOT NULL DEFAULT 0,
                reviewed_by     INTEGER REFERENCES users(id) ON DELETE SET NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                reviewed_at     TEXT,
                penalized_at    TEXT
            );

            CREATE INDEX idx_reports_status ON reports(status, created_at);

            CREATE TABLE report_warnings (
                user_id                  INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                warning_count            INTEGER NOT NULL DEFAULT 0 CHECK (warning_count >= 0),
                is_banned_from_reporting INTEGER NOT NULL DEFAULT 0,
                ban_until                TEXT,
                updated_at               TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE notifications (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category    TEXT NOT NULL,
                title       TEXT NOT NULL,
                body        TEXT NOT NULL,
                related_id  INTEGER,
                is_read     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, is_read, created_at);

            INSERT INTO categories (name, slug) VALUES
                ('General', 'general'),
                ('Announcements', 'announcements'),
                ('Help', 'help');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);

        let categories: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(categories, 3);
    }
}
