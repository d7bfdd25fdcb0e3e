//! Test Helper Utilities
//!
//! Shared utilities for testing setu-ca

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use setu_ca::analysis::{ContractAnalyzer, FixedScorer, TemplateClauseSource};
use setu_ca::config::DEFAULT_MAX_UPLOAD_BYTES;
use setu_ca::storage::LocalDocumentStore;
use setu_ca::{build_router, AppState};
use setu_common::db::users::{create_user, NewUser};
use setu_common::db::{init_database, User};

pub const BOUNDARY: &str = "setu-test-boundary";

/// Temporary root folder with database and document store
///
/// `_dir` must be kept alive for the duration of the test.
pub struct TestEnv {
    pub _dir: TempDir,
    pub pool: SqlitePool,
    pub documents: PathBuf,
}

pub async fn create_test_env() -> TestEnv {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("setu.db")).await.unwrap();
    let documents = dir.path().join("contracts");
    TestEnv {
        _dir: dir,
        pool,
        documents,
    }
}

impl TestEnv {
    pub async fn analyzer(&self, score: i64, max_upload_bytes: usize) -> ContractAnalyzer {
        let store = LocalDocumentStore::new(&self.documents).await.unwrap();
        ContractAnalyzer::new(
            self.pool.clone(),
            Arc::new(store),
            Arc::new(FixedScorer::new(score)),
            Arc::new(TemplateClauseSource),
            max_upload_bytes,
        )
    }

    /// Router whose scorer always returns `score`
    pub async fn app(&self, score: i64) -> Router {
        self.app_with_limit(score, DEFAULT_MAX_UPLOAD_BYTES).await
    }

    pub async fn app_with_limit(&self, score: i64, max_upload_bytes: usize) -> Router {
        let analyzer = self.analyzer(score, max_upload_bytes).await;
        build_router(AppState::new(self.pool.clone(), analyzer))
    }

    /// Provision a user whose bearer token is `token`
    pub async fn user(&self, new_user: NewUser, token: &str) -> User {
        create_user(&self.pool, &new_user, token).await.unwrap()
    }

    pub async fn worker(&self, username: &str) -> User {
        self.user(NewUser::worker(username), &format!("{}-token", username)).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub fn stored_documents(&self) -> usize {
        std::fs::read_dir(&self.documents)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Build a `multipart/form-data` body by hand
pub fn multipart_body(employer_name: Option<&str>, file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(name) = employer_name {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"employer_name\"\r\n\r\n");
        body.extend_from_slice(name.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((filename, content)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(token: &str, employer_name: Option<&str>, file: Option<(&str, &[u8])>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/contracts")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(employer_name, file)))
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
