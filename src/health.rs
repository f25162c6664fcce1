//! Auxiliary endpoints: `GET /health` and `GET /favicon.ico`.
//!
//! The health payload carries the server version, uptime, public URL,
//! build metadata embedded by `build.rs`, and cumulative request
//! statistics.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub public_url: String,
    pub build: BuildInfo,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct BuildInfo {
    pub commit: String,
    pub profile: String,
    pub target: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_forwarded: u64,
    pub requests_failed: u64,
    pub redirects_intercepted: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        public_url: state.config.public_url.to_string(),
        build: BuildInfo {
            commit: env!("CORS_PROXY_GIT_SHORT").to_string(),
            profile: env!("CORS_PROXY_BUILD_PROFILE").to_string(),
            target: env!("CORS_PROXY_TARGET").to_string(),
        },
        stats: StatsResponse {
            requests_forwarded: state.stats.forwarded.load(Ordering::Relaxed),
            requests_failed: state.stats.failed.load(Ordering::Relaxed),
            redirects_intercepted: state.stats.redirects_intercepted.load(Ordering::Relaxed),
        },
    })
}

pub async fn favicon_handler(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read(&state.config.favicon_path).await {
        Ok(content) => ([(CONTENT_TYPE, "image/x-icon")], content).into_response(),
        Err(e) => {
            tracing::debug!(
                path = %state.config.favicon_path.display(),
                error = %e,
                "favicon unavailable"
            );
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
