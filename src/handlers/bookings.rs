//! `POST /api/book`: the customer booking endpoint.
//!
//! Input problems are rejected before anything touches the database, then the
//! caller must be a signed-in, non-guest user acting for themselves. The rest
//! is delegated to [`BookingService`](crate::services::booking::BookingService).

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::rental::{Addon, DeliveryType};
use crate::errors::ServiceError;
use crate::handlers::common::{json_body, non_blank, parse_instant};
use crate::services::booking::{ContactDetails, NewBooking};
use crate::AppState;

/// Booking request as sent by the storefront. Everything is optional at the
/// wire level so missing fields produce our own 400 instead of a parse error.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_id: Option<String>,
    pub product_category: Option<String>,
    pub plan_id: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Exclusive end of the rental
    pub end_date: Option<String>,
    #[schema(value_type = Option<String>, example = "DELIVERY")]
    pub delivery_type: Option<DeliveryType>,
    pub address: Option<String>,
    pub addons: Option<Vec<Addon>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub total_amount: Option<Decimal>,
    pub is_guest: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub success: bool,
    pub booking_id: Uuid,
    pub console_id: Uuid,
    pub unit_id: String,
    pub total_price: Decimal,
    pub message: String,
}

/// Booking fields that passed shape validation.
#[derive(Debug)]
struct ValidatedRequest {
    category: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Upper bound for any single amount sent by the storefront.
const MAX_AMOUNT: Decimal = dec!(1000000);
const MAX_ADDON_QUANTITY: u32 = 50;

fn validate_addon(addon: &Addon) -> Result<(), ServiceError> {
    if addon.price.is_sign_negative() && !addon.price.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "addon {} has a negative price",
            addon.name
        )));
    }
    if addon.price > MAX_AMOUNT {
        return Err(ServiceError::ValidationError(format!(
            "addon {} price cannot exceed {}",
            addon.name, MAX_AMOUNT
        )));
    }
    if addon.quantity == 0 || addon.quantity > MAX_ADDON_QUANTITY {
        return Err(ServiceError::ValidationError(format!(
            "addon {} quantity must be 1-{}",
            addon.name, MAX_ADDON_QUANTITY
        )));
    }
    Ok(())
}

fn validate_request(request: &BookingRequest) -> Result<ValidatedRequest, ServiceError> {
    let mut missing = Vec::new();
    let category = non_blank(request.product_category.clone());
    if category.is_none() {
        missing.push("productCategory");
    }
    let start = non_blank(request.start_date.clone());
    if start.is_none() {
        missing.push("startDate");
    }
    let end = non_blank(request.end_date.clone());
    if end.is_none() {
        missing.push("endDate");
    }

    let (Some(category), Some(start), Some(end)) = (category, start, end) else {
        return Err(ServiceError::ValidationError(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    };

    let start = parse_instant("startDate", &start)?;
    let end = parse_instant("endDate", &end)?;
    if start >= end {
        return Err(ServiceError::ValidationError(
            "startDate must be before endDate".to_string(),
        ));
    }
    if let Some(total) = request.total_amount {
        if total.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "totalAmount cannot be negative".to_string(),
            ));
        }
        if total > MAX_AMOUNT {
            return Err(ServiceError::ValidationError(format!(
                "totalAmount cannot exceed {}",
                MAX_AMOUNT
            )));
        }
    }
    for addon in request.addons.iter().flatten() {
        validate_addon(addon)?;
    }

    Ok(ValidatedRequest {
        category,
        start,
        end,
    })
}

/// Resolves who is booking. Guests and anonymous callers are turned away, and
/// a signed-in user may only book for themselves.
fn resolve_caller(
    request: &BookingRequest,
    caller: Option<AuthUser>,
) -> Result<AuthUser, ServiceError> {
    if request.is_guest.unwrap_or(false) {
        return Err(ServiceError::GuestNotAllowed);
    }
    let caller = match caller {
        Some(user) if !user.is_guest => user,
        _ => return Err(ServiceError::GuestNotAllowed),
    };
    if let Some(claimed) = non_blank(request.user_id.clone()) {
        if claimed != caller.user_id {
            return Err(ServiceError::UserMismatch);
        }
    }
    Ok(caller)
}

/// Book a console for a date range
#[utoipa::path(
    post,
    path = "/api/book",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Guest or unauthenticated caller", body = crate::errors::ErrorResponse),
        (status = 403, description = "KYC, pickup or user mismatch", body = crate::errors::ErrorResponse),
        (status = 409, description = "No unit free for the range", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
#[instrument(skip_all)]
pub async fn book(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<BookingResponse>, ServiceError> {
    let request = json_body(payload)?;
    let valid = validate_request(&request)?;
    let caller = resolve_caller(&request, caller)?;

    let booking = NewBooking {
        user_id: caller.user_id,
        category: valid.category,
        plan_id: non_blank(request.plan_id),
        start: valid.start,
        end: valid.end,
        delivery_type: request.delivery_type.unwrap_or_default(),
        address: non_blank(request.address),
        addons: request.addons.unwrap_or_default(),
        contact: ContactDetails {
            first_name: request.first_name,
            last_name: request.last_name,
            mobile: request.mobile,
            email: request.email.or(caller.email),
        },
        total_amount: request.total_amount,
    };

    let confirmation = state.services.booking.book(booking).await?;
    info!(booking_id = %confirmation.booking_id, "booking request accepted");

    Ok(Json(BookingResponse {
        success: true,
        booking_id: confirmation.booking_id,
        console_id: confirmation.console_id,
        message: format!(
            "Booking received. Unit {} is reserved pending approval.",
            confirmation.unit_id
        ),
        unit_id: confirmation.unit_id,
        total_price: confirmation.total_price,
    }))
}
