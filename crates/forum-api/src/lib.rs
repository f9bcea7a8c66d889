pub mod auth;
pub mod bookmarks;
pub mod comments;
pub mod error;
pub mod middleware;
pub mod notifications;
pub mod penalties;
pub mod posts;
pub mod reports;
pub mod routes;
pub mod state;
mod views;

pub use routes::router;
pub use state::{AppState, AppStateInner, Settings};
