//! User identity persistence
//!
//! Users are provisioned by the external identity provider; services only
//! resolve bearer tokens to user records.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::models::{Language, ProfileType, User};
use crate::{identity, time, Result};

/// Fields required to provision a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub profile_type: ProfileType,
    pub language_preference: Language,
    pub monitored_worker_id: Option<i64>,
}

impl NewUser {
    pub fn worker(username: &str) -> Self {
        Self {
            username: username.to_string(),
            display_name: username.to_string(),
            profile_type: ProfileType::Worker,
            language_preference: Language::En,
            monitored_worker_id: None,
        }
    }

    pub fn family_of(username: &str, worker_id: i64) -> Self {
        Self {
            profile_type: ProfileType::Family,
            monitored_worker_id: Some(worker_id),
            ..Self::worker(username)
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language_preference = language;
        self
    }
}

const USER_COLUMNS: &str = "id, username, display_name, profile_type, language_preference, \
                            monitored_worker_id, created_at";

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let profile_type: String = row.try_get("profile_type")?;
    let language: String = row.try_get("language_preference")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        profile_type: profile_type.parse()?,
        language_preference: language.parse()?,
        monitored_worker_id: row.try_get("monitored_worker_id")?,
        created_at: time::from_db(&created_at)?,
    })
}

/// Provision a user with the given bearer token (only its hash is stored)
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser, token: &str) -> Result<User> {
    let created_at = time::now();

    let id = sqlx::query(
        r#"
        INSERT INTO users (
            username, display_name, profile_type, language_preference,
            monitored_worker_id, token_hash, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new_user.username)
    .bind(&new_user.display_name)
    .bind(new_user.profile_type.as_str())
    .bind(new_user.language_preference.as_str())
    .bind(new_user.monitored_worker_id)
    .bind(identity::hash_token(token))
    .bind(time::to_db(&created_at))
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(User {
        id,
        username: new_user.username.clone(),
        display_name: new_user.display_name.clone(),
        profile_type: new_user.profile_type,
        language_preference: new_user.language_preference,
        monitored_worker_id: new_user.monitored_worker_id,
        created_at,
    })
}

/// Resolve a bearer token to its user
pub async fn find_by_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE token_hash = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(identity::hash_token(token))
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Delete a user; analyses, clauses, notifications and activity cascade
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_database;
    use tempfile::TempDir;

    async fn test_pool() -> (TempDir, SqlitePool) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("users.db")).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_token_resolves_to_user() {
        let (_dir, pool) = test_pool().await;
        let created = create_user(&pool, &NewUser::worker("ram"), "tok-ram").await.unwrap();

        let found = find_by_token(&pool, "tok-ram").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.profile_type, ProfileType::Worker);

        assert!(find_by_token(&pool, "tok-other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_family_member_links_to_worker() {
        let (_dir, pool) = test_pool().await;
        let worker = create_user(&pool, &NewUser::worker("ram"), "t1").await.unwrap();
        let family = create_user(&pool, &NewUser::family_of("sita", worker.id), "t2")
            .await
            .unwrap();

        let loaded = get_user(&pool, family.id).await.unwrap().unwrap();
        assert_eq!(loaded.monitored_worker_id, Some(worker.id));
        assert_eq!(loaded.profile_type, ProfileType::Family);

        // Deleting the worker clears the link instead of the family account
        assert!(delete_user(&pool, worker.id).await.unwrap());
        let loaded = get_user(&pool, family.id).await.unwrap().unwrap();
        assert_eq!(loaded.monitored_worker_id, None);
    }
}
