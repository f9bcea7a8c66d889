mod config;
mod sweep;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use forum_api::{AppState, AppStateInner};
use forum_core::BanExpiry;
use forum_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forum=debug,forum_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Set the FORUM_* variables in your .env file and restart.");
            std::process::exit(1);
        }
    };

    // Init database
    let db = Database::open(&config.db_path)?;
    info!("Database ready at {}", config.db_path.display());

    let penalty = config.settings.penalty;
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        settings: config.settings,
    });

    if penalty.ban_expiry == BanExpiry::Automatic {
        tokio::spawn(sweep::run_ban_sweep_loop(state.clone(), config.ban_sweep_secs));
        info!("Reporting bans expire automatically (sweep every {}s)", config.ban_sweep_secs);
    } else {
        info!("Reporting bans stay until an admin lifts them");
    }

    let app = forum_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Forum server listening on {}", addr);
    info!(
        "False reports before a ban: {}, ban length: {} days",
        penalty.false_report_threshold,
        penalty.ban_duration.num_days()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down..."),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}
