use std::sync::Arc;

use tracing::error;

use forum_core::PenaltyPolicy;
use forum_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub settings: Settings,
}

/// Runtime behaviour switches, loaded by the server from the environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Usernames that receive the admin role when they register.
    pub admin_usernames: Vec<String>,
    /// Hold new non-admin comments for approval.
    pub comments_require_approval: bool,
    pub penalty: PenaltyPolicy,
}

impl Settings {
    pub fn is_admin_username(&self, username: &str) -> bool {
        self.admin_usernames
            .iter()
            .any(|name| name.eq_ignore_ascii_case(username))
    }
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
}
