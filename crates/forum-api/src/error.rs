use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use forum_core::PenaltyError;
use forum_types::models::UnknownVariant;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Penalty(#[from] PenaltyError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("You do not have permission to do that".to_string())
    }
}

impl From<UnknownVariant> for ApiError {
    fn from(e: UnknownVariant) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Penalty(e) => {
                let (status, code) = match e {
                    PenaltyError::NoPenaltyRecord => (StatusCode::NOT_FOUND, "NO_PENALTY_RECORD"),
                    PenaltyError::InvalidAction(_) => (StatusCode::BAD_REQUEST, "INVALID_ACTION"),
                    PenaltyError::AlreadyAtFloor => (StatusCode::CONFLICT, "ALREADY_AT_FLOOR"),
                    PenaltyError::NotBanned => (StatusCode::CONFLICT, "NOT_BANNED"),
                };
                (status, code, e.to_string())
            }
            ApiError::Internal(e) => {
                error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_errors_map_to_statuses() {
        let cases = [
            (PenaltyError::NoPenaltyRecord, StatusCode::NOT_FOUND),
            (PenaltyError::InvalidAction("x".into()), StatusCode::BAD_REQUEST),
            (PenaltyError::AlreadyAtFloor, StatusCode::CONFLICT),
            (PenaltyError::NotBanned, StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn internal_errors_hide_detail() {
        let resp = ApiError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
