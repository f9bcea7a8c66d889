/// Database row types — these map directly to SQLite rows.
/// Enum-like columns stay as strings so the DB layer does not depend on forum-types.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub author_id: i64,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub comment_count: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct NewPost<'a> {
    pub kind: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub tags: &'a [String],
}

#[derive(Debug, Default)]
pub struct PostFilter<'a> {
    pub kind: Option<&'a str>,
    pub tag: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct PostTagRow {
    pub post_id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TagCountRow {
    pub name: String,
    pub post_count: i64,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub author_id: i64,
    pub author_username: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: i64,
    pub reporter_id: i64,
    pub report_type: String,
    pub target_id: i64,
    pub reason: String,
    pub details: Option<String>,
    pub status: String,
    pub is_false_report: bool,
    pub reviewed_by: Option<i64>,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

pub struct NewReport<'a> {
    pub reporter_id: i64,
    pub report_type: &'a str,
    pub target_id: i64,
    pub reason: &'a str,
    pub details: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWarningRow {
    pub user_id: i64,
    pub warning_count: i64,
    pub is_banned_from_reporting: bool,
    /// SQLite `datetime` layout, see `crate::time`.
    pub ban_until: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub title: String,
    pub body: String,
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: String,
}

pub struct NewNotification<'a> {
    pub user_id: i64,
    pub category: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub related_id: Option<i64>,
}
