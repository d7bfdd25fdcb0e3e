//! Activity feed endpoint

use axum::{extract::State, routing::get, Json, Router};

use setu_common::db::{activity, ActivityLog};

use crate::api::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

const FEED_LIMIT: i64 = 50;

/// GET /activity
///
/// A worker's own log, or the monitored worker's log for a family member.
/// A family member with no linked worker gets an empty list.
pub async fn activity_feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<ActivityLog>>> {
    let entries = match activity::feed_owner(&user) {
        Some(owner_id) => activity::list_for_user(&state.db, owner_id, FEED_LIMIT).await?,
        None => Vec::new(),
    };
    Ok(Json(entries))
}

/// Build activity routes
pub fn activity_routes() -> Router<AppState> {
    Router::new().route("/activity", get(activity_feed))
}
