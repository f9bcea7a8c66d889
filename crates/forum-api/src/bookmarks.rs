use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use forum_types::api::{Claims, PostResponse};

use crate::error::{ApiError, Result};
use crate::posts::with_tags;
use crate::state::{AppState, blocking};

/// POST /posts/{id}/bookmark — add the bookmark if absent, remove it otherwise.
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>> {
    let bookmarked = blocking(&state, move |s| {
        if s.db.get_post(post_id)?.is_none() {
            return Err(ApiError::not_found("Post"));
        }
        Ok(s.db.toggle_bookmark(claims.sub, post_id)?)
    })
    .await?;

    Ok(Json(json!({ "bookmarked": bookmarked })))
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PostResponse>>> {
    let posts = blocking(&state, move |s| {
        let rows = s.db.list_bookmarked_posts(claims.sub)?;
        with_tags(s, rows)
    })
    .await?;

    Ok(Json(posts))
}
