use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use forum_api::AppState;
use forum_api::penalties::sweep_expired_bans;

/// Background task that lifts reporting bans past their `ban_until`.
///
/// Only spawned when bans expire automatically.
pub async fn run_ban_sweep_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let task_state = state.clone();
        let result =
            tokio::task::spawn_blocking(move || sweep_expired_bans(&task_state, Utc::now())).await;

        match result {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Ban sweep: lifted {} expired reporting bans", count);
                }
            }
            Ok(Err(e)) => {
                warn!("Ban sweep error: {}", e);
            }
            Err(e) => {
                warn!("Ban sweep task failed: {}", e);
            }
        }
    }
}
