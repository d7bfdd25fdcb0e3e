//! setu-ca library - Contract Risk Analyzer
//!
//! Scores uploaded employment contracts, flags risky clauses, and notifies
//! the uploading worker.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod analysis;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use crate::analysis::ContractAnalyzer;

/// Multipart framing and the employer field on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Analysis workflow with its injected scorer, clause source and store
    pub analyzer: Arc<ContractAnalyzer>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, analyzer: ContractAnalyzer) -> Self {
        Self {
            db,
            analyzer: Arc::new(analyzer),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `/health` is public; every other route requires a bearer token via the
/// `CurrentUser` extractor.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state
        .analyzer
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .merge(api::contract_routes().layer(DefaultBodyLimit::max(upload_limit)))
        .merge(api::notification_routes())
        .merge(api::activity_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
