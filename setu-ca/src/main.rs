//! setu-ca (Contract Risk Analyzer)
//!
//! Accepts contract uploads from workers, scores them, flags risky clauses,
//! and serves the resulting reports, notifications, and activity feed.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use setu_ca::analysis::{ContractAnalyzer, TemplateClauseSource};
use setu_ca::config::{Cli, ConfigSource, ServiceConfig};
use setu_ca::db::open_database;
use setu_ca::storage::{DocumentStore, LocalDocumentStore};
use setu_ca::{build_router, AppState};
use setu_common::config::{CompiledDefaults, RootFolderInitializer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, source) = ServiceConfig::resolve(cli);

    // RUST_LOG wins over the TOML level
    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| CompiledDefaults::for_current_platform().log_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)))
        .init();

    // Build identification first, before any database work
    info!(
        "Starting Setu Contract Risk Analyzer (setu-ca) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &source {
        ConfigSource::Defaults => info!("No config file; using CLI, environment and defaults"),
        ConfigSource::Loaded(path) => info!("Loaded config file {}", path.display()),
        ConfigSource::Ignored(path, e) => warn!("Ignoring config file {}: {}", path.display(), e),
    }

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = open_database(&db_path).await?;
    info!("✓ Database ready");

    let store = LocalDocumentStore::new(initializer.documents_path())
        .await
        .context("Failed to initialize document store")?;
    info!(
        backend = store.backend_type(),
        path = %store.base_path().display(),
        "Document store ready"
    );

    let scorer = config.scorer.build();
    info!(
        scorer = %config.scorer,
        max_upload_bytes = config.max_upload_bytes,
        "Analyzer configured"
    );

    let analyzer = ContractAnalyzer::new(
        pool.clone(),
        Arc::new(store),
        scorer,
        Arc::new(TemplateClauseSource),
        config.max_upload_bytes,
    );

    let app = build_router(AppState::new(pool, analyzer));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("setu-ca listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
