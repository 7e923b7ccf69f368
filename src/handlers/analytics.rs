use axum::{extract::State, Json};

use crate::auth::AdminUser;
use crate::services::analytics::PaymentSummary;
use crate::{ApiResponse, ApiResult, AppState};

/// Payment totals by status and paid revenue by month
#[utoipa::path(
    get,
    path = "/api/admin/analytics/payments",
    responses(
        (status = 200, description = "Payment summary", body = PaymentSummary),
        (status = 403, description = "Not an admin", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn payment_summary(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<PaymentSummary> {
    let summary = state.services.analytics.payment_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}
