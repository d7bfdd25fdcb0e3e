//! Integration tests for database initialization
//!
//! Tests cover:
//! - Automatic database creation on first run
//! - Idempotent schema application on existing databases
//! - Cascading deletes from users to owned records

use setu_common::db::init::{init_database, SCHEMA_VERSION};
use setu_common::db::users::{create_user, delete_user, NewUser};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("setu.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("setu.db");

    let pool1 = init_database(&db_path).await.unwrap();
    create_user(&pool1, &NewUser::worker("ram"), "tok").await.unwrap();
    pool1.close().await;

    // Second open must keep existing rows
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.as_ref().err());
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool2.unwrap())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_expected_tables_exist() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("setu.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "activity_logs",
        "contract_analyses",
        "flagged_clauses",
        "notifications",
        "schema_version",
        "users",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[tokio::test]
async fn test_user_deletion_cascades() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("setu.db")).await.unwrap();
    let user = create_user(&pool, &NewUser::worker("ram"), "tok").await.unwrap();

    let analysis_id = sqlx::query(
        "INSERT INTO contract_analyses (user_id, file_ref, analyzed_at, risk_score, risk_level)
         VALUES (?, 'ref', '2025-01-01T00:00:00.000000Z', 50, 'medium')",
    )
    .bind(user.id)
    .execute(&pool)
    .await
    .unwrap()
    .last_insert_rowid();

    sqlx::query(
        "INSERT INTO flagged_clauses (analysis_id, clause_reference, title, severity, original_text)
         VALUES (?, 'Clause 7.1', 't', 'illegal', 'x')",
    )
    .bind(analysis_id)
    .execute(&pool)
    .await
    .unwrap();

    assert!(delete_user(&pool, user.id).await.unwrap());

    for table in ["contract_analyses", "flagged_clauses"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "{} rows survived user deletion", table);
    }
}

#[tokio::test]
async fn test_risk_level_check_constraint() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("setu.db")).await.unwrap();
    let user = create_user(&pool, &NewUser::worker("ram"), "tok").await.unwrap();

    let result = sqlx::query(
        "INSERT INTO contract_analyses (user_id, file_ref, analyzed_at, risk_score, risk_level)
         VALUES (?, 'ref', '2025-01-01T00:00:00.000000Z', 150, 'extreme')",
    )
    .bind(user.id)
    .execute(&pool)
    .await;

    assert!(result.is_err(), "out-of-range score should be rejected");
}
