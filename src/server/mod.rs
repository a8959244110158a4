//! HTTP API — Axum JSON server over the flip engine and item data.
//!
//! All endpoints return JSON and are read-only; CORS is enabled for GET
//! so browser frontends can consume the API directly.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::engine::FlipEngine;
use crate::feed::SnapshotSource;

/// Shared state accessible by all route handlers.
pub struct ApiState {
    pub engine: FlipEngine,
    /// Same feed the engine scans; serves the per-item detail endpoints.
    pub source: Arc<dyn SnapshotSource>,
}

impl ApiState {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            engine: FlipEngine::new(source.clone()),
            source,
        }
    }
}

pub type AppState = Arc<ApiState>;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/best-flips", get(routes::get_best_flips))
        .route("/api/items/list", get(routes::get_item_list))
        .route("/api/items/latest-lite", get(routes::get_latest_lite))
        .route("/api/items/:id/history", get(routes::get_item_history))
        .route("/api/items/:id/guide", get(routes::get_item_guide))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Serve the API until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "API server starting on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    axum::serve(listener, app).await.context("API server error")?;
    Ok(())
}
