use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use forum_core::{Notification, record_false_report};
use forum_db::models::NewReport;
use forum_types::api::{Claims, CreateReportRequest, ReportResponse, ReviewReportRequest};
use forum_types::models::{NotificationCategory, ReportStatus};

use crate::error::{ApiError, Result};
use crate::notifications::notify;
use crate::state::{AppState, AppStateInner, blocking};
use crate::views;

const MAX_DETAILS_LEN: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
}

fn validate_details(details: Option<String>) -> Result<Option<String>> {
    let details = details
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if details.as_ref().is_some_and(|d| d.len() > MAX_DETAILS_LEN) {
        return Err(ApiError::BadRequest(format!(
            "Details must be at most {} bytes",
            MAX_DETAILS_LEN
        )));
    }
    Ok(details)
}

fn check_target(state: &AppStateInner, reporter_id: i64, req: &CreateReportRequest) -> Result<()> {
    match req.report_type.post_kind() {
        None => {
            if req.target_id == reporter_id {
                return Err(ApiError::BadRequest("You cannot report yourself".to_string()));
            }
            if !state.db.user_exists(req.target_id)? {
                return Err(ApiError::not_found("User"));
            }
        }
        Some(kind) => {
            let post = state
                .db
                .get_post(req.target_id)?
                .ok_or_else(|| ApiError::not_found("Post"))?;
            if post.kind != kind.as_str() {
                return Err(ApiError::BadRequest(format!(
                    "Target {} is not a {}",
                    req.target_id,
                    kind.as_str()
                )));
            }
        }
    }
    Ok(())
}

/// POST /reports — refused while the reporter's ban is in force.
pub async fn create_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReportRequest>,
) -> Result<impl IntoResponse> {
    let details = validate_details(req.details.clone())?;

    let row = blocking(&state, move |s| {
        if let Some(row) = s.db.get_report_warning(claims.sub)? {
            let warning = views::warning_from_row(row);
            if warning.is_ban_active(Utc::now(), s.settings.penalty.ban_expiry) {
                return Err(ApiError::Forbidden(
                    "You are banned from submitting reports".to_string(),
                ));
            }
        }

        check_target(s, claims.sub, &req)?;

        let id = s.db.insert_report(&NewReport {
            reporter_id: claims.sub,
            report_type: req.report_type.as_str(),
            target_id: req.target_id,
            reason: req.reason.as_str(),
            details: details.as_deref(),
        })?;

        s.db.get_report(id)?
            .ok_or_else(|| ApiError::not_found("Report"))
    })
    .await?;

    info!(
        "User {} reported {} {} ({})",
        claims.sub, row.report_type, row.target_id, row.reason
    );

    Ok((StatusCode::CREATED, Json(views::report(row)?)))
}

/// GET /reports/mine
pub async fn my_reports(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ReportResponse>>> {
    let rows = blocking(&state, move |s| Ok(s.db.list_reports_by_reporter(claims.sub)?)).await?;
    let reports = rows
        .into_iter()
        .map(views::report)
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(reports))
}

/// GET /admin/reports
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<ReportResponse>>> {
    let rows = blocking(&state, move |s| {
        Ok(s.db.list_reports(query.status.map(|st| st.as_str()))?)
    })
    .await?;
    let reports = rows
        .into_iter()
        .map(views::report)
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(reports))
}

/// POST /admin/reports/{id}/review
///
/// The first time a report is marked false it counts a warning against the
/// reporter and may ban them. Any other verdict just tells the reporter.
pub async fn review_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReviewReportRequest>,
) -> Result<Json<ReportResponse>> {
    if req.status == ReportStatus::Pending {
        return Err(ApiError::BadRequest(
            "A review must move the report out of pending".to_string(),
        ));
    }

    let row = blocking(&state, move |s| {
        let existing = s
            .db
            .get_report(id)?
            .ok_or_else(|| ApiError::not_found("Report"))?;

        if !s
            .db
            .review_report(id, req.status.as_str(), req.is_false_report, claims.sub)?
        {
            return Err(ApiError::not_found("Report"));
        }

        // A report counts against its reporter at most once, even if the
        // verdict is flipped and flipped back.
        if req.is_false_report && s.db.mark_report_penalized(id)? {
            penalize_reporter(s, existing.reporter_id, id)?;
        } else {
            notify(
                s,
                &Notification {
                    user_id: existing.reporter_id,
                    category: NotificationCategory::ReportReviewed,
                    title: "Your report was reviewed".to_string(),
                    body: format!("Report #{} is now {}.", id, req.status.as_str()),
                    related_id: Some(id),
                },
            );
        }

        s.db.get_report(id)?
            .ok_or_else(|| ApiError::not_found("Report"))
    })
    .await?;

    info!(
        "Admin {} reviewed report {} as {} (false: {})",
        claims.sub, id, row.status, row.is_false_report
    );

    Ok(Json(views::report(row)?))
}

fn penalize_reporter(state: &AppStateInner, reporter_id: i64, report_id: i64) -> Result<()> {
    let current = state
        .db
        .get_report_warning(reporter_id)?
        .map(views::warning_from_row);

    let outcome = record_false_report(
        current.as_ref(),
        reporter_id,
        report_id,
        &state.settings.penalty,
        Utc::now(),
    );
    state
        .db
        .save_report_warning(&views::warning_to_row(&outcome.new_state))?;
    notify(state, &outcome.notification);

    info!(
        "Reporter {} now has {} false-report warning(s) (banned: {})",
        reporter_id, outcome.new_state.warning_count, outcome.new_state.is_banned_from_reporting
    );
    Ok(())
}
