use anyhow::Result;
use rusqlite::{Connection, Row};

use crate::models::{CategoryRow, NewPost, PostFilter, PostRow, PostTagRow, TagCountRow};
use crate::{Database, OptionalExt};

// JOIN users to fetch author_username and count approved comments in one query
const POST_SELECT: &str = "
    SELECT p.id, p.kind, p.title, p.body, p.author_id, u.username, p.category_id,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.is_approved = 1),
           p.created_at, p.updated_at
    FROM posts p
    LEFT JOIN users u ON p.author_id = u.id";

const POST_FILTER: &str = "
    WHERE (?1 IS NULL OR p.kind = ?1)
      AND (?2 IS NULL OR EXISTS (
            SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = p.id AND t.name = ?2))";

impl Database {
    // -- Categories --

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, slug FROM categories ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(CategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        slug: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn category_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }

    // -- Posts --

    /// Insert a post with its tags in one transaction. Returns the new id.
    pub fn create_post(&self, post: &NewPost<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO posts (kind, title, body, author_id, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    post.kind,
                    post.title,
                    post.body,
                    post.author_id,
                    post.category_id,
                ],
            )?;
            let id = tx.last_insert_rowid();
            replace_tags(&tx, id, post.tags)?;
            tx.commit()?;
            Ok(id)
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE p.id = ?1", POST_SELECT);
            let row = conn.query_row(&sql, [id], map_post).optional()?;
            Ok(row)
        })
    }

    /// Newest first. Returns the page and the total number of matching posts.
    pub fn list_posts(
        &self,
        filter: &PostFilter<'_>,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<PostRow>, i64)> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM posts p {}", POST_FILTER),
                rusqlite::params![filter.kind, filter.tag],
                |row| row.get(0),
            )?;

            let sql = format!(
                "{} {} ORDER BY p.created_at DESC, p.id DESC LIMIT ?3 OFFSET ?4",
                POST_SELECT, POST_FILTER
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![filter.kind, filter.tag, limit, offset as i64],
                    map_post,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }

    /// Patch title/body/tags. `None` leaves a field alone. Returns false if the
    /// post does not exist.
    pub fn update_post(
        &self,
        id: i64,
        title: Option<&str>,
        body: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE posts
                 SET title = COALESCE(?2, title),
                     body = COALESCE(?3, body),
                     updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![id, title, body],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            if let Some(tags) = tags {
                replace_tags(&tx, id, tags)?;
            }
            tx.commit()?;
            Ok(true)
        })
    }

    /// Delete a post. Comments, tags links and bookmarks go with it.
    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Tags --

    /// Batch-fetch tag names for a set of post IDs.
    pub fn tags_for_posts(&self, post_ids: &[i64]) -> Result<Vec<PostTagRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=post_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT pt.post_id, t.name FROM post_tags pt
                 JOIN tags t ON t.id = pt.tag_id
                 WHERE pt.post_id IN ({})
                 ORDER BY t.name",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(post_ids.iter()), |row| {
                    Ok(PostTagRow {
                        post_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Tags in use, most used first.
    pub fn list_tags(&self) -> Result<Vec<TagCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.name, COUNT(pt.post_id) AS n
                 FROM tags t
                 JOIN post_tags pt ON pt.tag_id = t.id
                 GROUP BY t.id
                 ORDER BY n DESC, t.name",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(TagCountRow {
                        name: row.get(0)?,
                        post_count: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Bookmarks --

    /// Toggle a bookmark: removes if it exists, inserts if not.
    /// Returns true when the post is bookmarked afterwards.
    pub fn toggle_bookmark(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM bookmarks WHERE user_id = ?1 AND post_id = ?2",
                [user_id, post_id],
            )?;
            if removed > 0 {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO bookmarks (user_id, post_id) VALUES (?1, ?2)",
                [user_id, post_id],
            )?;
            Ok(true)
        })
    }

    pub fn list_bookmarked_posts(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} JOIN bookmarks b ON b.post_id = p.id
                 WHERE b.user_id = ?1
                 ORDER BY b.created_at DESC, p.id DESC",
                POST_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn replace_tags(conn: &Connection, post_id: i64, tags: &[String]) -> Result<()> {
    conn.execute("DELETE FROM post_tags WHERE post_id = ?1", [post_id])?;
    for name in tags {
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [name])?;
        conn.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id)
             SELECT ?1, id FROM tags WHERE name = ?2",
            rusqlite::params![post_id, name],
        )?;
    }
    Ok(())
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        author_id: row.get(4)?,
        author_username: row
            .get::<_, Option<String>>(5)?
            .unwrap_or_else(|| "unknown".to_string()),
        category_id: row.get(6)?,
        comment_count: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let author = db.create_user("author", "hash", "user").unwrap();
        (db, author)
    }

    fn post<'a>(author_id: i64, kind: &'a str, tags: &'a [String]) -> NewPost<'a> {
        NewPost {
            kind,
            title: "Title",
            body: "Body",
            author_id,
            category_id: Some(1),
            tags,
        }
    }

    #[test]
    fn create_post_with_tags() {
        let (db, author) = seeded();
        let tags = vec!["rust".to_string(), "sqlite".to_string()];
        let id = db.create_post(&post(author, "article", &tags)).unwrap();

        let row = db.get_post(id).unwrap().unwrap();
        assert_eq!(row.author_username, "author");
        assert_eq!(row.kind, "article");
        assert_eq!(row.comment_count, 0);

        let names: Vec<String> = db
            .tags_for_posts(&[id])
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["rust", "sqlite"]);
    }

    #[test]
    fn list_posts_filters_by_kind_and_tag() {
        let (db, author) = seeded();
        let rust = vec!["rust".to_string()];
        let none: Vec<String> = vec![];
        db.create_post(&post(author, "article", &rust)).unwrap();
        db.create_post(&post(author, "document", &none)).unwrap();
        db.create_post(&post(author, "document", &rust)).unwrap();

        let (all, total) = db.list_posts(&PostFilter::default(), 10, 0).unwrap();
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);

        let docs = PostFilter { kind: Some("document"), tag: None };
        let (rows, total) = db.list_posts(&docs, 10, 0).unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().all(|r| r.kind == "document"));

        let rust_docs = PostFilter { kind: Some("document"), tag: Some("rust") };
        let (_, total) = db.list_posts(&rust_docs, 10, 0).unwrap();
        assert_eq!(total, 1);

        let (page, total) = db.list_posts(&PostFilter::default(), 2, 2).unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
    }

    #[test]
    fn update_post_replaces_tags() {
        let (db, author) = seeded();
        let tags = vec!["old".to_string()];
        let id = db.create_post(&post(author, "article", &tags)).unwrap();

        let new_tags = vec!["new".to_string()];
        assert!(db.update_post(id, Some("Renamed"), None, Some(&new_tags)).unwrap());
        assert!(!db.update_post(id + 1, Some("x"), None, None).unwrap());

        let row = db.get_post(id).unwrap().unwrap();
        assert_eq!(row.title, "Renamed");
        assert_eq!(row.body, "Body");
        assert!(row.updated_at.is_some());

        let listed: Vec<String> = db.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(listed, vec!["new"]);
    }

    #[test]
    fn bookmark_toggles() {
        let (db, author) = seeded();
        let id = db.create_post(&post(author, "article", &[])).unwrap();

        assert!(db.toggle_bookmark(author, id).unwrap());
        assert_eq!(db.list_bookmarked_posts(author).unwrap().len(), 1);
        assert!(!db.toggle_bookmark(author, id).unwrap());
        assert!(db.list_bookmarked_posts(author).unwrap().is_empty());
    }

    #[test]
    fn delete_post_removes_row() {
        let (db, author) = seeded();
        let id = db.create_post(&post(author, "article", &[])).unwrap();
        db.toggle_bookmark(author, id).unwrap();

        assert!(db.delete_post(id).unwrap());
        assert!(db.get_post(id).unwrap().is_none());
        assert!(db.list_bookmarked_posts(author).unwrap().is_empty());
        assert!(!db.delete_post(id).unwrap());
    }
}
