use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::notification;
use crate::handlers::common::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u64>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Vec<notification::Model>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let items = state
        .services
        .notifications
        .list_for_user(&user.user_id, query.unread_only, limit)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<notification::Model> {
    let updated = state
        .services
        .notifications
        .mark_read(&user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
