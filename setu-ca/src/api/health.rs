//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Active risk scorer, so a fixed-score deployment is visible
    pub scorer: &'static str,
    pub uptime_seconds: i64,
}

/// GET /health
///
/// Does NOT require authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "setu-ca",
        version: env!("CARGO_PKG_VERSION"),
        scorer: state.analyzer.scorer_name(),
        uptime_seconds: (Utc::now() - state.startup_time).num_seconds(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
