use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use forum_core::{Notification, NotificationSink, deliver};
use forum_db::Database;
use forum_db::models::NewNotification;
use forum_types::api::{Claims, NotificationResponse};

use crate::error::{ApiError, Result};
use crate::state::{AppState, AppStateInner, blocking};
use crate::views;

/// Persists notifications to the `notifications` table for later delivery.
pub struct DbNotificationSink<'a>(pub &'a Database);

impl NotificationSink for DbNotificationSink<'_> {
    fn send(&self, n: &Notification) -> anyhow::Result<()> {
        self.0.insert_notification(&NewNotification {
            user_id: n.user_id,
            category: n.category.as_str(),
            title: &n.title,
            body: &n.body,
            related_id: n.related_id,
        })?;
        Ok(())
    }
}

/// Fire-and-forget: a failed insert is logged, never returned.
pub(crate) fn notify(state: &AppStateInner, notification: &Notification) {
    deliver(&DbNotificationSink(&state.db), notification);
}

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<NotificationResponse>>> {
    let rows = blocking(&state, move |s| {
        Ok(s.db.list_notifications(claims.sub, query.unread_only)?)
    })
    .await?;

    let notifications = rows
        .into_iter()
        .map(views::notification)
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode> {
    let updated =
        blocking(&state, move |s| Ok(s.db.mark_notification_read(id, claims.sub)?)).await?;
    if !updated {
        return Err(ApiError::not_found("Notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}
