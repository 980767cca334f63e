use anyhow::Result;
use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

mod config;
mod error;
mod logging;
mod routes;
mod services;
mod models;

use services::session::SessionStore;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;
    let addr = config.bind_addr;
    tracing::info!(
        "Config: max file size {}KB, preview {} rows, {} histogram bins, sessions idle after {}s",
        config.max_file_size / 1024,
        config.preview_rows,
        config.histogram_bins,
        config.session_idle_secs
    );

    // Build our application state
    let state = Arc::new(AppState::new(config));
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;
    routes::routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

// Application state
pub struct AppState {
    config: config::Config,
    sessions: SessionStore,
    http: reqwest::Client,
}

impl AppState {
    fn new(config: config::Config) -> Self {
        let sessions = SessionStore::new(
            config.max_sessions,
            Duration::from_secs(config.session_idle_secs),
        );
        Self {
            config,
            sessions,
            http: reqwest::Client::new(),
        }
    }
}
