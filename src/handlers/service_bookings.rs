use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminUser;
use crate::entities::service_booking::{self, ServiceBookingStatus};
use crate::handlers::common::{json_body, non_blank, parse_instant, validate_input};
use crate::services::service_bookings::NewServiceBooking;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateServiceBookingRequest {
    #[validate(length(min = 1, max = 120, message = "customer_name is required"))]
    pub customer_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 32, message = "phone must be 6-32 characters"))]
    pub phone: String,
    #[validate(length(min = 1, max = 64, message = "device_category is required"))]
    pub device_category: String,
    #[validate(length(min = 1, max = 2000, message = "issue must be 1-2000 characters"))]
    pub issue: String,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub scheduled_for: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceBookingListQuery {
    pub status: Option<ServiceBookingStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateServiceBookingStatusRequest {
    #[schema(value_type = String, example = "CONFIRMED")]
    pub status: ServiceBookingStatus,
}

/// Public repair intake.
pub async fn create_service_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateServiceBookingRequest>, JsonRejection>,
) -> ApiResult<service_booking::Model> {
    let request = json_body(payload)?;
    validate_input(&request)?;

    let scheduled_for = match non_blank(request.scheduled_for) {
        Some(raw) => Some(parse_instant("scheduled_for", &raw)?),
        None => None,
    };

    let created = state
        .services
        .service_bookings
        .create(NewServiceBooking {
            customer_name: request.customer_name.trim().to_string(),
            email: non_blank(request.email),
            phone: request.phone.trim().to_string(),
            device_category: request.device_category.trim().to_string(),
            issue: request.issue,
            scheduled_for,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn list_service_bookings(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ServiceBookingListQuery>,
) -> ApiResult<Vec<service_booking::Model>> {
    let bookings = state.services.service_bookings.list(query.status).await?;
    Ok(Json(ApiResponse::success(bookings)))
}

pub async fn update_service_booking_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateServiceBookingStatusRequest>, JsonRejection>,
) -> ApiResult<service_booking::Model> {
    let request = json_body(payload)?;
    let updated = state
        .services
        .service_bookings
        .update_status(id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
