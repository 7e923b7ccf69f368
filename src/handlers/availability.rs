use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::ServiceError;
use crate::handlers::common::non_blank;
use crate::services::availability::{CalendarMode, DayAvailability};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    /// Console category, case-sensitive
    pub category: Option<String>,
    pub year: Option<i32>,
    /// 1-12
    pub month: Option<u32>,
    /// `approximate` (default) or `exact`
    #[param(value_type = Option<String>)]
    pub mode: Option<CalendarMode>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarResponse {
    pub category: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayAvailability>,
}

/// Day-by-day availability for one category and month
#[utoipa::path(
    get,
    path = "/api/availability",
    params(CalendarQuery),
    responses(
        (status = 200, description = "One entry per day of the month", body = CalendarResponse),
        (status = 400, description = "Missing category or invalid month", body = crate::errors::ErrorResponse)
    ),
    tag = "Availability"
)]
pub async fn monthly_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<CalendarResponse> {
    let category = non_blank(query.category)
        .ok_or_else(|| ServiceError::ValidationError("category is required".to_string()))?;
    let (year, month) = match (query.year, query.month) {
        (Some(year), Some(month)) => (year, month),
        _ => {
            return Err(ServiceError::ValidationError(
                "year and month are required".to_string(),
            ))
        }
    };

    let days = state
        .services
        .availability
        .monthly_calendar(&category, year, month, query.mode.unwrap_or_default())
        .await?;

    Ok(Json(ApiResponse::success(CalendarResponse {
        category,
        year,
        month,
        days,
    })))
}
