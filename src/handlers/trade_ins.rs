use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminUser, AuthUser};
use crate::entities::trade_in::{self, TradeInStatus};
use crate::handlers::common::{json_body, validate_input};
use crate::services::trade_ins::NewTradeIn;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTradeInRequest {
    #[validate(length(min = 1, max = 120, message = "customer_name is required"))]
    pub customer_name: String,
    #[validate(length(min = 6, max = 32, message = "phone must be 6-32 characters"))]
    pub phone: String,
    #[validate(length(min = 1, max = 64, message = "device_category is required"))]
    pub device_category: String,
    #[validate(length(min = 1, max = 500, message = "condition is required"))]
    pub condition: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTradeInRequest {
    #[schema(value_type = String, example = "QUOTED")]
    pub status: TradeInStatus,
    pub offered_price: Option<Decimal>,
}

/// Public trade-in intake; a signed-in caller's id is attached when present.
pub async fn create_trade_in(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    payload: Result<Json<CreateTradeInRequest>, JsonRejection>,
) -> ApiResult<trade_in::Model> {
    let request = json_body(payload)?;
    validate_input(&request)?;

    let created = state
        .services
        .trade_ins
        .create(NewTradeIn {
            user_id: caller.filter(|u| !u.is_guest).map(|u| u.user_id),
            customer_name: request.customer_name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            device_category: request.device_category.trim().to_string(),
            condition: request.condition.trim().to_string(),
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn list_trade_ins(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<trade_in::Model>> {
    let trade_ins = state.services.trade_ins.list().await?;
    Ok(Json(ApiResponse::success(trade_ins)))
}

pub async fn update_trade_in(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTradeInRequest>, JsonRejection>,
) -> ApiResult<trade_in::Model> {
    let request = json_body(payload)?;
    let updated = state
        .services
        .trade_ins
        .update(id, request.status, request.offered_price)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
