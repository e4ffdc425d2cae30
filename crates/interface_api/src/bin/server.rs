//! Fraud Detection API - Server Binary
//!
//! This binary starts the HTTP API server for fraud scoring.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin fraud-api
//!
//! # Run with environment variables
//! API_PORT=9000 API_MODEL_DIR=/var/lib/fraud/models cargo run --bin fraud-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8000)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_LOG_FORMAT` - `text` or `json` (default: text)
//! * `API_MODEL_DIR` - Directory holding the ensemble artifacts (default: models)
//! * `API_PRELOAD_MODELS` - Load the ensemble at startup (default: false)
//! * `API_FRAUD_THRESHOLD` - Detected-fraud threshold for analytics (default: 0.5)
//! * `API_PREVENTED_LOSS_PER_FRAUD` - Savings per detected fraud (default: 50000)

use anyhow::Context;
use interface_api::{config::{ApiConfig, LogFormat}, create_router, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration in the environment is invalid
/// - `API_PRELOAD_MODELS` is set and the model set cannot be loaded
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        model_dir = %config.model_dir.display(),
        "Starting Fraud Detection API Server"
    );

    let state = AppState::from_config(config.clone()).context("building fraud engine")?;

    if config.preload_models {
        let engine = state.engine.clone();
        tokio::task::spawn_blocking(move || engine.preload())
            .await
            .context("model preload task")?
            .context("loading ensemble models")?;
    }

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
