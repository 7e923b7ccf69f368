use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminUser;
use crate::entities::console::{self, ConsoleStatus};
use crate::handlers::common::{json_body, non_blank, validate_input};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ConsoleListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateConsoleRequest {
    #[validate(length(min = 1, max = 64, message = "unit_id must be 1-64 characters"))]
    pub unit_id: String,
    #[validate(length(min = 1, max = 64, message = "category must be 1-64 characters"))]
    pub category: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConsoleStatusRequest {
    /// `ACTIVE`, `MAINTENANCE` or `RETIRED`
    #[schema(value_type = String, example = "MAINTENANCE")]
    pub status: ConsoleStatus,
    pub notes: Option<String>,
}

pub async fn list_consoles(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ConsoleListQuery>,
) -> ApiResult<Vec<console::Model>> {
    let units = state
        .services
        .consoles
        .list(non_blank(query.category))
        .await?;
    Ok(Json(ApiResponse::success(units)))
}

pub async fn create_console(
    State(state): State<AppState>,
    _admin: AdminUser,
    payload: Result<Json<CreateConsoleRequest>, JsonRejection>,
) -> ApiResult<console::Model> {
    let request = json_body(payload)?;
    validate_input(&request)?;

    let created = state
        .services
        .consoles
        .create(
            request.unit_id.trim().to_string(),
            request.category.trim().to_string(),
            non_blank(request.notes),
        )
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn update_console_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateConsoleStatusRequest>, JsonRejection>,
) -> ApiResult<console::Model> {
    let request = json_body(payload)?;
    let updated = state
        .services
        .consoles
        .update_status(id, request.status, non_blank(request.notes))
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
