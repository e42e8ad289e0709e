//! Availability survey and topic board for a study group.
//!
//! Participants tick the weekday hours they can attend; the aggregated
//! selections are rendered as a heatmap with the most popular slots ranked.
//! Alongside the survey, a topic board collects talk ideas that anyone can
//! upvote. Both flows persist into a workbook of append-only sheets.
//!
//! # Configuration
//! Settings come from an optional JSON file named by
//! `SURVEY_CONFIG`, then `SURVEY_*` environment variables override them.
//! Workbook credentials are read from `SURVEY_SERVICE_ACCOUNT_JSON` or the
//! file named by `SURVEY_SERVICE_ACCOUNT_FILE`. Without credentials the
//! server still starts, but nothing is persisted.
//!
//! # Logging
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub mod aggregate;
pub mod config;
pub mod error;
pub mod server;
pub mod slots;
pub mod store;
pub mod survey;
pub mod topics;
pub mod types;

use config::Config;
use store::ServiceAccount;
use types::AppState;

/// Loads configuration, opens the workbook, and serves until a shutdown
/// signal arrives.
pub async fn start_server() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Initializing state...");
    let config = Config::load().context("Failed to load configuration")?;
    let address = format!("{}:{}", config.address, config.port);
    let state = AppState::new(config, ServiceAccount::from_env());

    let app = server::create_router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
