use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};

use forum_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Reject non-admins. Must run inside `require_auth`.
pub async fn require_admin(
    Extension(claims): Extension<Claims>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden("Administrator access required".to_string()));
    }
    Ok(next.run(req).await)
}
