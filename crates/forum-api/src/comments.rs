use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use forum_core::{CommentNode, Notification, Pagination, build_comment_tree};
use forum_db::models::CommentRow;
use forum_types::api::{
    Claims, CommentResponse, CreateCommentRequest, SetApprovalRequest, UpdateCommentRequest,
};
use forum_types::models::NotificationCategory;

use crate::error::{ApiError, Result};
use crate::notifications::notify;
use crate::state::{AppState, AppStateInner, blocking};
use crate::views;

const MAX_COMMENT_LEN: usize = 5_000;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct CommentQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CommentPage {
    pub comments: Vec<CommentNode<CommentResponse>>,
    pub total_roots: usize,
    pub page: u32,
    pub size: u32,
}

fn validate_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() || content.len() > MAX_COMMENT_LEN {
        return Err(ApiError::BadRequest(format!(
            "Comment must be non-empty and at most {} bytes",
            MAX_COMMENT_LEN
        )));
    }
    Ok(content.to_string())
}

fn load_comment(state: &AppStateInner, id: i64) -> Result<CommentRow> {
    state
        .db
        .get_comment(id)?
        .ok_or_else(|| ApiError::not_found("Comment"))
}

/// Tell the parent comment's author, or the post author for a root comment.
/// Nobody is notified about their own comment. Lookup failures are logged;
/// they never fail the comment operation.
fn notify_comment_created(state: &AppStateInner, comment: &CommentRow) {
    if let Err(e) = try_notify_comment_created(state, comment) {
        warn!("Skipping notification for comment {}: {}", comment.id, e);
    }
}

fn try_notify_comment_created(state: &AppStateInner, comment: &CommentRow) -> anyhow::Result<()> {
    let (recipient, category, title) = match comment.parent_id {
        Some(parent_id) => {
            let parent = state
                .db
                .get_comment(parent_id)?
                .ok_or_else(|| anyhow::anyhow!("parent comment {} is gone", parent_id))?;
            (parent.author_id, NotificationCategory::CommentReply, "New reply to your comment")
        }
        None => {
            let post = state
                .db
                .get_post(comment.post_id)?
                .ok_or_else(|| anyhow::anyhow!("post {} is gone", comment.post_id))?;
            (post.author_id, NotificationCategory::PostComment, "New comment on your post")
        }
    };

    if recipient != comment.author_id {
        notify(
            state,
            &Notification {
                user_id: recipient,
                category,
                title: title.to_string(),
                body: format!("{} wrote: {}", comment.author_username, preview(&comment.content)),
                related_id: Some(comment.id),
            },
        );
    }
    Ok(())
}

fn preview(content: &str) -> String {
    const PREVIEW_CHARS: usize = 80;
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut)
}

/// GET /posts/{id}/comments — one page of root comments with their replies.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<CommentPage>> {
    let page = Pagination::capped(query.page, query.size, MAX_PAGE_SIZE);

    let rows = blocking(&state, move |s| {
        if s.db.get_post(post_id)?.is_none() {
            return Err(ApiError::not_found("Post"));
        }
        Ok(s.db.get_thread_comments(post_id)?)
    })
    .await?;

    let comments: Vec<CommentResponse> = rows.into_iter().map(views::comment).collect();
    let tree = build_comment_tree(comments, page);

    Ok(Json(CommentPage {
        comments: tree.roots,
        total_roots: tree.total_roots,
        page: page.page,
        size: page.size,
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse> {
    let content = validate_content(&req.content)?;
    let approved = claims.is_admin() || !state.settings.comments_require_approval;

    let row = blocking(&state, move |s| {
        if s.db.get_post(post_id)?.is_none() {
            return Err(ApiError::not_found("Post"));
        }

        if let Some(parent_id) = req.parent_id {
            let parent = s
                .db
                .get_comment(parent_id)?
                .ok_or_else(|| ApiError::BadRequest("Parent comment does not exist".to_string()))?;
            if parent.post_id != post_id {
                return Err(ApiError::BadRequest(
                    "Parent comment belongs to a different post".to_string(),
                ));
            }
            if parent.parent_id.is_some() {
                return Err(ApiError::BadRequest(
                    "Replies can only be made to top-level comments".to_string(),
                ));
            }
            if !parent.is_approved {
                return Err(ApiError::BadRequest(
                    "Cannot reply to a comment awaiting approval".to_string(),
                ));
            }
        }

        let id = s
            .db
            .insert_comment(post_id, req.parent_id, claims.sub, &content, approved)?;
        let row = load_comment(s, id)?;

        if approved {
            notify_comment_created(s, &row);
        }
        Ok(row)
    })
    .await?;

    info!(
        "User {} commented {} on post {} (approved: {})",
        claims.sub, row.id, post_id, approved
    );

    Ok((StatusCode::CREATED, Json(views::comment(row))))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>> {
    let content = validate_content(&req.content)?;

    let row = blocking(&state, move |s| {
        let existing = load_comment(s, id)?;
        if !claims.can_modify(existing.author_id) {
            return Err(ApiError::forbidden());
        }
        s.db.update_comment_content(id, &content)?;
        load_comment(s, id)
    })
    .await?;

    Ok(Json(views::comment(row)))
}

/// DELETE /comments/{id} — permanent; replies are removed with it.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode> {
    blocking(&state, move |s| {
        let existing = load_comment(s, id)?;
        if !claims.can_modify(existing.author_id) {
            return Err(ApiError::forbidden());
        }
        s.db.delete_comment(id)?;
        info!("User {} deleted comment {}", claims.sub, id);
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/comments/{id}/approval
pub async fn set_approval(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetApprovalRequest>,
) -> Result<Json<CommentResponse>> {
    let approved = req.approved;
    let row = blocking(&state, move |s| {
        let existing = load_comment(s, id)?;
        s.db.set_comment_approval(id, approved)?;
        let row = load_comment(s, id)?;

        if approved && !existing.is_approved {
            notify_comment_created(s, &row);
        }
        Ok(row)
    })
    .await?;

    info!("Admin {} set approval of comment {} to {}", claims.sub, id, approved);
    Ok(Json(views::comment(row)))
}

/// GET /admin/comments/pending
pub async fn list_pending(State(state): State<AppState>) -> Result<Json<Vec<CommentResponse>>> {
    let rows = blocking(&state, |s| Ok(s.db.list_pending_comments()?)).await?;
    Ok(Json(rows.into_iter().map(views::comment).collect()))
}
