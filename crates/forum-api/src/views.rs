//! Row → response conversions.

use chrono::{DateTime, Utc};
use tracing::warn;

use forum_core::{BanExpiry, ReportWarning};
use forum_db::models::{CommentRow, NotificationRow, PostRow, ReportRow, ReportWarningRow};
use forum_db::time::{format_timestamp, parse_timestamp};
use forum_types::api::{
    CommentResponse, NotificationResponse, PostResponse, ReportResponse, ReportWarningResponse,
};

use crate::error::Result;

fn timestamp(raw: &str, what: &str, id: i64) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt timestamp '{}' on {} {}", raw, what, id);
        DateTime::default()
    })
}

fn optional_timestamp(raw: Option<&str>, what: &str, id: i64) -> Option<DateTime<Utc>> {
    raw.map(|r| timestamp(r, what, id))
}

pub(crate) fn post(row: PostRow, tags: Vec<String>) -> Result<PostResponse> {
    Ok(PostResponse {
        kind: row.kind.parse()?,
        created_at: timestamp(&row.created_at, "post", row.id),
        updated_at: optional_timestamp(row.updated_at.as_deref(), "post", row.id),
        id: row.id,
        title: row.title,
        body: row.body,
        author_id: row.author_id,
        author_username: row.author_username,
        category_id: row.category_id,
        tags,
        comment_count: row.comment_count,
    })
}

pub(crate) fn comment(row: CommentRow) -> CommentResponse {
    CommentResponse {
        created_at: timestamp(&row.created_at, "comment", row.id),
        updated_at: optional_timestamp(row.updated_at.as_deref(), "comment", row.id),
        id: row.id,
        post_id: row.post_id,
        parent_id: row.parent_id,
        author_id: row.author_id,
        author_username: row.author_username,
        content: row.content,
        is_approved: row.is_approved,
    }
}

pub(crate) fn report(row: ReportRow) -> Result<ReportResponse> {
    Ok(ReportResponse {
        report_type: row.report_type.parse()?,
        reason: row.reason.parse()?,
        status: row.status.parse()?,
        created_at: timestamp(&row.created_at, "report", row.id),
        reviewed_at: optional_timestamp(row.reviewed_at.as_deref(), "report", row.id),
        id: row.id,
        reporter_id: row.reporter_id,
        target_id: row.target_id,
        details: row.details,
        is_false_report: row.is_false_report,
        reviewed_by: row.reviewed_by,
    })
}

pub(crate) fn notification(row: NotificationRow) -> Result<NotificationResponse> {
    Ok(NotificationResponse {
        category: row.category.parse()?,
        created_at: timestamp(&row.created_at, "notification", row.id),
        id: row.id,
        title: row.title,
        body: row.body,
        related_id: row.related_id,
        is_read: row.is_read,
    })
}

pub(crate) fn warning_from_row(row: ReportWarningRow) -> ReportWarning {
    ReportWarning {
        user_id: row.user_id,
        warning_count: u32::try_from(row.warning_count.max(0)).unwrap_or(u32::MAX),
        is_banned_from_reporting: row.is_banned_from_reporting,
        ban_until: optional_timestamp(row.ban_until.as_deref(), "report warning", row.user_id),
    }
}

pub(crate) fn warning_to_row(warning: &ReportWarning) -> ReportWarningRow {
    ReportWarningRow {
        user_id: warning.user_id,
        warning_count: i64::from(warning.warning_count),
        is_banned_from_reporting: warning.is_banned_from_reporting,
        ban_until: warning.ban_until.map(format_timestamp),
    }
}

pub(crate) fn warning(
    warning: &ReportWarning,
    now: DateTime<Utc>,
    expiry: BanExpiry,
) -> ReportWarningResponse {
    ReportWarningResponse {
        user_id: warning.user_id,
        warning_count: warning.warning_count,
        is_banned_from_reporting: warning.is_banned_from_reporting,
        ban_until: warning.ban_until,
        state: warning.state(),
        ban_active: warning.is_ban_active(now, expiry),
    }
}
