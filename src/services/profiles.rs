use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::entities::profile::{self, KycStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::eligibility::{Eligibility, EligibilityService};

/// The caller's own view: stored profile (if any) plus booking eligibility.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOverview {
    pub user_id: String,
    pub profile: Option<profile::Model>,
    pub eligibility: Eligibility,
}

#[derive(Clone)]
pub struct ProfileService {
    db_pool: Arc<DatabaseConnection>,
    eligibility: EligibilityService,
    event_sender: EventSender,
}

impl ProfileService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        eligibility: EligibilityService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db_pool,
            eligibility,
            event_sender,
        }
    }

    pub async fn overview(&self, user_id: &str) -> Result<ProfileOverview, ServiceError> {
        let profile = profile::Entity::find_by_id(user_id.to_string())
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        let eligibility = self.eligibility.check(user_id).await?;

        Ok(ProfileOverview {
            user_id: user_id.to_string(),
            profile,
            eligibility,
        })
    }

    /// Records a KYC review outcome and notifies the customer.
    #[instrument(skip(self))]
    pub async fn set_kyc(
        &self,
        user_id: &str,
        kyc_status: KycStatus,
    ) -> Result<profile::Model, ServiceError> {
        let current = profile::Entity::find_by_id(user_id.to_string())
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Profile {} not found", user_id)))?;

        let mut active: profile::ActiveModel = current.into();
        active.kyc_status = Set(kyc_status);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(user_id, %kyc_status, "kyc status reviewed");
        self.event_sender
            .send_or_log(Event::KycReviewed {
                user_id: user_id.to_string(),
                status: kyc_status.to_string(),
            });

        Ok(updated)
    }
}
