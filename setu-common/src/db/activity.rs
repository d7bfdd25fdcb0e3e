//! Activity log persistence (append-only audit trail)

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::models::{ActivityEventType, ActivityLog, ProfileType, User};
use crate::{time, Result};

fn activity_from_row(row: &SqliteRow) -> Result<ActivityLog> {
    let event_type: String = row.try_get("event_type")?;
    let timestamp: String = row.try_get("timestamp")?;

    Ok(ActivityLog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        event_type: event_type.parse()?,
        description: row.try_get("description")?,
        timestamp: time::from_db(&timestamp)?,
    })
}

pub async fn record_activity(
    pool: &SqlitePool,
    user_id: i64,
    event_type: ActivityEventType,
    description: &str,
) -> Result<ActivityLog> {
    let timestamp = time::now();

    let id = sqlx::query(
        "INSERT INTO activity_logs (user_id, event_type, description, timestamp) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(event_type.as_str())
    .bind(description)
    .bind(time::to_db(&timestamp))
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(ActivityLog {
        id,
        user_id,
        event_type,
        description: description.to_string(),
        timestamp,
    })
}

/// List a user's activity, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: i64, limit: i64) -> Result<Vec<ActivityLog>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, event_type, description, timestamp
        FROM activity_logs
        WHERE user_id = ?
        ORDER BY timestamp DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(activity_from_row).collect()
}

/// Whose activity feed a user sees
///
/// Workers see their own log. Family members see the monitored worker's log,
/// or nothing when no worker is linked.
pub fn feed_owner(viewer: &User) -> Option<i64> {
    match viewer.profile_type {
        ProfileType::Worker => Some(viewer.id),
        ProfileType::Family => viewer.monitored_worker_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_database;
    use crate::db::users::{create_user, NewUser};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_family_feed_follows_worker() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("a.db")).await.unwrap();
        let worker = create_user(&pool, &NewUser::worker("ram"), "a").await.unwrap();
        let family = create_user(&pool, &NewUser::family_of("sita", worker.id), "b")
            .await
            .unwrap();
        let unlinked = create_user(
            &pool,
            &NewUser {
                monitored_worker_id: None,
                ..NewUser::family_of("gita", worker.id)
            },
            "c",
        )
        .await
        .unwrap();

        record_activity(&pool, worker.id, ActivityEventType::CheckIn, "Checked in - Safe")
            .await
            .unwrap();
        record_activity(&pool, worker.id, ActivityEventType::Contract, "analyzed")
            .await
            .unwrap();

        assert_eq!(feed_owner(&worker), Some(worker.id));
        assert_eq!(feed_owner(&family), Some(worker.id));
        assert_eq!(feed_owner(&unlinked), None);

        let feed = list_for_user(&pool, worker.id, 50).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].event_type, ActivityEventType::Contract);
    }
}
