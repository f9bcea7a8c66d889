use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use tracing::info;

use forum_core::{PenaltyError, ReportWarning, apply_penalty_action, lift_expired_ban};
use forum_db::time::format_timestamp;
use forum_types::api::{Claims, PenaltyActionRequest, ReportWarningResponse};

use crate::error::{ApiError, Result};
use crate::notifications::notify;
use crate::state::{AppState, AppStateInner, blocking};
use crate::views;

fn require_user(state: &AppStateInner, user_id: i64) -> Result<()> {
    if !state.db.user_exists(user_id)? {
        return Err(ApiError::not_found("User"));
    }
    Ok(())
}

fn load_warning(state: &AppStateInner, user_id: i64) -> Result<Option<ReportWarning>> {
    Ok(state
        .db
        .get_report_warning(user_id)?
        .map(views::warning_from_row))
}

/// GET /admin/users/{id}/report-penalty
pub async fn get_user_penalty(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ReportWarningResponse>> {
    let warning = blocking(&state, move |s| {
        require_user(s, user_id)?;
        load_warning(s, user_id)?.ok_or(ApiError::Penalty(PenaltyError::NoPenaltyRecord))
    })
    .await?;

    Ok(Json(views::warning(
        &warning,
        Utc::now(),
        state.settings.penalty.ban_expiry,
    )))
}

/// POST /admin/users/{id}/report-penalty
///
/// A body that does not name a known action is reported as `INVALID_ACTION`
/// rather than the generic extractor rejection.
pub async fn apply_user_penalty(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<PenaltyActionRequest>, JsonRejection>,
) -> Result<Json<ReportWarningResponse>> {
    let Json(req) =
        payload.map_err(|e| ApiError::Penalty(PenaltyError::InvalidAction(e.body_text())))?;
    let action = req.action;

    let warning = blocking(&state, move |s| {
        require_user(s, user_id)?;

        // Read and write are separate statements: two admins acting on the
        // same user at once can lose one update.
        let current = load_warning(s, user_id)?;
        let outcome = apply_penalty_action(current.as_ref(), action)?;

        s.db.save_report_warning(&views::warning_to_row(&outcome.new_state))?;
        notify(s, &outcome.notification);
        Ok(outcome.new_state)
    })
    .await?;

    info!(
        "Admin {} applied {} to user {} (warnings: {}, banned: {})",
        claims.sub, action, user_id, warning.warning_count, warning.is_banned_from_reporting
    );

    Ok(Json(views::warning(
        &warning,
        Utc::now(),
        state.settings.penalty.ban_expiry,
    )))
}

/// GET /me/report-penalty — a user with no record sees a clear one.
pub async fn my_penalty(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ReportWarningResponse>> {
    let warning = blocking(&state, move |s| load_warning(s, claims.sub))
        .await?
        .unwrap_or_else(|| ReportWarning::new(claims.sub));

    Ok(Json(views::warning(
        &warning,
        Utc::now(),
        state.settings.penalty.ban_expiry,
    )))
}

/// Lift every reporting ban whose `ban_until` is at or before `now`.
/// Returns how many were lifted.
pub fn sweep_expired_bans(state: &AppStateInner, now: DateTime<Utc>) -> anyhow::Result<usize> {
    let expired = state.db.list_expired_report_bans(&format_timestamp(now))?;
    let mut lifted = 0;

    for row in expired {
        let warning = views::warning_from_row(row);
        let Some(outcome) = lift_expired_ban(&warning, now) else {
            continue;
        };
        state
            .db
            .save_report_warning(&views::warning_to_row(&outcome.new_state))?;
        notify(state, &outcome.notification);
        info!("Reporting ban for user {} expired", warning.user_id);
        lifted += 1;
    }

    Ok(lifted)
}
