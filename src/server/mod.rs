//! HTTP dashboard server.
//!
//! There is no server-side session: each request carries its ClickUp token
//! and the server keeps only configuration and the report directory.

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::report::ReportStore;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration.
    pub config: Arc<Config>,
    /// Stored reports.
    pub store: ReportStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = ReportStore::new(&config.report.output_dir);
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

/// Build the HTTP router for the dashboard.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/login", post(routes::login))
        .route("/teams", get(routes::list_teams))
        .route("/teams/{team_id}/spaces", get(routes::list_spaces))
        .route("/spaces/{space_id}", get(routes::space_dashboard))
        .route("/spaces/{space_id}/reports", post(routes::create_report))
        .route("/reports", get(routes::list_reports))
        .route("/reports/{filename}", get(routes::view_report))
        .route("/reports/{filename}/download", get(routes::download_report))
        .route("/api/task_stats/{space_id}", get(routes::api_task_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
