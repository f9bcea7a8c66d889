use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use forum_core::Pagination;
use forum_db::models::{NewPost, PostFilter, PostRow};
use forum_types::api::{
    CategoryResponse, Claims, CreatePostRequest, PostListResponse, PostResponse, TagResponse,
    UpdatePostRequest,
};
use forum_types::models::PostKind;

use crate::error::{ApiError, Result};
use crate::state::{AppState, AppStateInner, blocking};
use crate::views;

const MAX_TITLE_LEN: usize = 200;
const MAX_BODY_LEN: usize = 50_000;
const MAX_TAGS: usize = 10;
const MAX_TAG_LEN: usize = 32;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub kind: Option<PostKind>,
    pub tag: Option<String>,
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Title must be between 1 and {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_body(body: &str) -> Result<()> {
    if body.trim().is_empty() || body.len() > MAX_BODY_LEN {
        return Err(ApiError::BadRequest(format!(
            "Body must be non-empty and at most {} bytes",
            MAX_BODY_LEN
        )));
    }
    Ok(())
}

/// Trim, lowercase and dedupe tags, keeping first-seen order.
fn normalize_tags(tags: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for raw in tags {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(ApiError::BadRequest(format!(
                "Tags must be at most {} characters",
                MAX_TAG_LEN
            )));
        }
        out.push(tag);
    }
    if out.len() > MAX_TAGS {
        return Err(ApiError::BadRequest(format!("At most {} tags per post", MAX_TAGS)));
    }
    Ok(out)
}

/// Attach tags to rows and convert them to responses.
pub(crate) fn with_tags(state: &AppStateInner, rows: Vec<PostRow>) -> Result<Vec<PostResponse>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut tags: HashMap<i64, Vec<String>> = HashMap::new();
    for t in state.db.tags_for_posts(&ids)? {
        tags.entry(t.post_id).or_default().push(t.name);
    }

    rows.into_iter()
        .map(|row| {
            let post_tags = tags.remove(&row.id).unwrap_or_default();
            views::post(row, post_tags)
        })
        .collect()
}

pub(crate) fn load_post(state: &AppStateInner, id: i64) -> Result<PostResponse> {
    let row = state.db.get_post(id)?.ok_or_else(|| ApiError::not_found("Post"))?;
    with_tags(state, vec![row])?
        .pop()
        .ok_or_else(|| ApiError::not_found("Post"))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<Json<PostListResponse>> {
    let page = Pagination::capped(query.page, query.size, MAX_PAGE_SIZE);

    let (posts, total) = blocking(&state, move |s| {
        let tag = query.tag.map(|t| t.trim().to_lowercase());
        let filter = PostFilter {
            kind: query.kind.map(|k| k.as_str()),
            tag: tag.as_deref(),
        };
        let (rows, total) = s.db.list_posts(&filter, page.size, page.offset() as u64)?;
        Ok((with_tags(s, rows)?, total))
    })
    .await?;

    Ok(Json(PostListResponse {
        posts,
        total,
        page: page.page,
        size: page.size,
    }))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>> {
    let post = blocking(&state, move |s| load_post(s, id)).await?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse> {
    let title = validate_title(&req.title)?;
    validate_body(&req.body)?;
    let tags = normalize_tags(&req.tags)?;

    let post = blocking(&state, move |s| {
        if let Some(category_id) = req.category_id {
            if !s.db.category_exists(category_id)? {
                return Err(ApiError::BadRequest("Unknown category".to_string()));
            }
        }

        let id = s.db.create_post(&NewPost {
            kind: req.kind.as_str(),
            title: &title,
            body: &req.body,
            author_id: claims.sub,
            category_id: req.category_id,
            tags: &tags,
        })?;
        info!("User {} created {} {}", claims.sub, req.kind.as_str(), id);

        load_post(s, id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>> {
    let title = req.title.as_deref().map(validate_title).transpose()?;
    if let Some(body) = &req.body {
        validate_body(body)?;
    }
    let tags = req.tags.as_deref().map(normalize_tags).transpose()?;

    let post = blocking(&state, move |s| {
        let existing = s.db.get_post(id)?.ok_or_else(|| ApiError::not_found("Post"))?;
        if !claims.can_modify(existing.author_id) {
            return Err(ApiError::forbidden());
        }

        if !s
            .db
            .update_post(id, title.as_deref(), req.body.as_deref(), tags.as_deref())?
        {
            return Err(ApiError::not_found("Post"));
        }

        load_post(s, id)
    })
    .await?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode> {
    blocking(&state, move |s| {
        let existing = s.db.get_post(id)?.ok_or_else(|| ApiError::not_found("Post"))?;
        if !claims.can_modify(existing.author_id) {
            return Err(ApiError::forbidden());
        }
        s.db.delete_post(id)?;
        info!("User {} deleted post {}", claims.sub, id);
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>> {
    let rows = blocking(&state, |s| Ok(s.db.list_categories()?)).await?;
    Ok(Json(
        rows.into_iter()
            .map(|c| CategoryResponse {
                id: c.id,
                name: c.name,
                slug: c.slug,
            })
            .collect(),
    ))
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>> {
    let rows = blocking(&state, |s| Ok(s.db.list_tags()?)).await?;
    Ok(Json(
        rows.into_iter()
            .map(|t| TagResponse {
                name: t.name,
                post_count: t.post_count,
            })
            .collect(),
    ))
}
