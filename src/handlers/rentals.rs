use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::entities::rental::{self, Addon, PaymentStatus, RentalStatus};
use crate::handlers::common::{json_body, non_blank, page_and_limit, total_pages};
use crate::services::rentals::{OverdueSweep, RentalFilter};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RentalListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    /// `Pending`, `active`, `overdue`, `completed` or `cancelled`
    #[param(value_type = Option<String>)]
    pub status: Option<RentalStatus>,
    pub category: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RentalSummary {
    pub id: Uuid,
    pub user_id: String,
    pub console_id: Uuid,
    pub product_id: Option<Uuid>,
    pub plan_id: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub payment_status: String,
    pub total_price: Decimal,
    pub delivery_type: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub addons: Vec<Addon>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<rental::Model> for RentalSummary {
    fn from(model: rental::Model) -> Self {
        let addons = match model.addons {
            Some(raw) => serde_json::from_value(raw).unwrap_or_else(|e| {
                warn!(rental_id = %model.id, error = %e, "unreadable addons column");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Self {
            id: model.id,
            user_id: model.user_id,
            console_id: model.console_id,
            product_id: model.product_id,
            plan_id: model.plan_id,
            start_date: model.start_date,
            end_date: model.end_date,
            status: model.status.to_string(),
            payment_status: model.payment_status.to_string(),
            total_price: model.total_price,
            delivery_type: model.delivery_type.to_string(),
            address: model.address,
            notes: model.notes,
            addons,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    #[schema(value_type = String, example = "paid")]
    pub payment_status: PaymentStatus,
}

/// List rentals (admin)
#[utoipa::path(
    get,
    path = "/api/admin/rentals",
    params(RentalListQuery),
    responses(
        (status = 200, description = "Page of rentals, newest first"),
        (status = 401, description = "Missing token", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not an admin", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_rentals(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RentalListQuery>,
) -> ApiResult<PaginatedResponse<RentalSummary>> {
    let (page, limit) = page_and_limit(query.page, query.limit);
    let filter = RentalFilter {
        status: query.status,
        category: non_blank(query.category),
        user_id: non_blank(query.user_id),
    };

    let (records, total) = state.services.rentals.list(filter, page, limit).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: records.into_iter().map(RentalSummary::from).collect(),
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    })))
}

pub async fn get_rental(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<RentalSummary> {
    let rental = state.services.rentals.get(id).await?;
    Ok(Json(ApiResponse::success(RentalSummary::from(rental))))
}

pub async fn approve_rental(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<RentalSummary> {
    let rental = state.services.rentals.approve(id).await?;
    Ok(Json(ApiResponse::success(RentalSummary::from(rental))))
}

pub async fn complete_rental(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<RentalSummary> {
    let rental = state.services.rentals.complete(id).await?;
    Ok(Json(ApiResponse::success(RentalSummary::from(rental))))
}

pub async fn cancel_rental(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<RentalSummary> {
    let rental = state.services.rentals.cancel(id).await?;
    Ok(Json(ApiResponse::success(RentalSummary::from(rental))))
}

pub async fn update_payment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePaymentRequest>, JsonRejection>,
) -> ApiResult<RentalSummary> {
    let request = json_body(payload)?;
    let rental = state
        .services
        .rentals
        .update_payment(id, request.payment_status)
        .await?;
    Ok(Json(ApiResponse::success(RentalSummary::from(rental))))
}

pub async fn mark_overdue(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<OverdueSweep> {
    let sweep = state.services.rentals.mark_overdue().await?;
    let message = format!("{} rental(s) marked overdue", sweep.marked_overdue);
    Ok(Json(ApiResponse::with_message(sweep, message)))
}
