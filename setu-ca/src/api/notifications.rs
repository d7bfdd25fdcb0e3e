//! Notification inbox endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use setu_common::db::{notifications, Notification};

use crate::api::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllResponse {
    pub updated: u64,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let items = notifications::list_for_user(&state.db, user.id, query.unread_only).await?;
    Ok(Json(items))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UnreadCountResponse>> {
    let unread = notifications::unread_count(&state.db, user.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(notification_id): Path<i64>,
) -> ApiResult<Json<UnreadCountResponse>> {
    if !notifications::mark_read(&state.db, user.id, notification_id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    let unread = notifications::unread_count(&state.db, user.id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MarkAllResponse>> {
    let updated = notifications::mark_all_read(&state.db, user.id).await?;
    Ok(Json(MarkAllResponse { updated }))
}

/// Build notification routes
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/:id/read", post(mark_read))
}
