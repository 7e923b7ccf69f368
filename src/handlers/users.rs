use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::{AdminUser, AuthUser};
use crate::entities::profile::{self, KycStatus};
use crate::handlers::common::json_body;
use crate::services::profiles::ProfileOverview;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateKycRequest {
    #[schema(value_type = String, example = "APPROVED")]
    pub kyc_status: KycStatus,
}

/// The caller's profile and what they may book.
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<ProfileOverview> {
    let overview = state.services.profiles.overview(&user.user_id).await?;
    Ok(Json(ApiResponse::success(overview)))
}

pub async fn update_kyc(
    State(state): State<AppState>,
    AdminUser(reviewer): AdminUser,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateKycRequest>, JsonRejection>,
) -> ApiResult<profile::Model> {
    let request = json_body(payload)?;
    tracing::info!(reviewer = %reviewer.user_id, %user_id, "kyc review submitted");
    let updated = state
        .services
        .profiles
        .set_kyc(&user_id, request.kyc_status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
