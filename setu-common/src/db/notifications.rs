//! In-app notification persistence
//!
//! Notifications are append-only apart from the read flag.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::models::{Notification, NotificationCategory};
use crate::{time, Result};

fn notification_from_row(row: &SqliteRow) -> Result<Notification> {
    let category: String = row.try_get("category")?;
    let created_at: String = row.try_get("created_at")?;
    let is_read: i64 = row.try_get("is_read")?;

    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        category: category.parse()?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        is_read: is_read != 0,
        created_at: time::from_db(&created_at)?,
    })
}

/// Append a notification for a user
pub async fn create_notification(
    pool: &SqlitePool,
    user_id: i64,
    category: NotificationCategory,
    title: &str,
    description: &str,
) -> Result<Notification> {
    let created_at = time::now();

    let id = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, category, title, description, is_read, created_at)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(user_id)
    .bind(category.as_str())
    .bind(title)
    .bind(description)
    .bind(time::to_db(&created_at))
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(Notification {
        id,
        user_id,
        category,
        title: title.to_string(),
        description: description.to_string(),
        is_read: false,
        created_at,
    })
}

/// List a user's notifications, newest first
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: i64,
    unread_only: bool,
) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, category, title, description, is_read, created_at
        FROM notifications
        WHERE user_id = ? AND (? = 0 OR is_read = 0)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_all(pool)
    .await?;

    rows.iter().map(notification_from_row).collect()
}

pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Mark one notification read. Returns false if it does not belong to the user.
pub async fn mark_read(pool: &SqlitePool, user_id: i64, notification_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark all of a user's notifications read, returning how many changed
pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
