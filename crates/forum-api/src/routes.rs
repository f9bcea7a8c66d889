use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::middleware::{require_admin, require_auth};
use crate::state::AppState;
use crate::{auth, bookmarks, comments, notifications, penalties, posts, reports};

/// All HTTP routes. CORS and request tracing are layered on by the server.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", get(posts::get_post))
        .route("/posts/{id}/comments", get(comments::list_comments))
        .route("/categories", get(posts::list_categories))
        .route("/tags", get(posts::list_tags));

    let protected_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts/{id}", put(posts::update_post).delete(posts::delete_post))
        .route("/posts/{id}/comments", post(comments::create_comment))
        .route(
            "/comments/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/posts/{id}/bookmark", post(bookmarks::toggle_bookmark))
        .route("/bookmarks", get(bookmarks::list_bookmarks))
        .route("/reports", post(reports::create_report))
        .route("/reports/mine", get(reports::my_reports))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/me/report-penalty", get(penalties::my_penalty))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/admin/reports", get(reports::list_reports))
        .route("/admin/reports/{id}/review", post(reports::review_report))
        .route(
            "/admin/users/{id}/report-penalty",
            get(penalties::get_user_penalty).post(penalties::apply_user_penalty),
        )
        .route("/admin/comments/pending", get(comments::list_pending))
        .route("/admin/comments/{id}/approval", post(comments::set_approval))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
