use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::entities::profile::{self, KycStatus};
use crate::errors::ServiceError;

/// What a user is allowed to do when booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub is_verified: bool,
    pub can_pickup: bool,
    pub is_first_time: bool,
}

impl Eligibility {
    /// Full access, used for demo accounts.
    pub const UNRESTRICTED: Eligibility = Eligibility {
        is_verified: true,
        can_pickup: true,
        is_first_time: false,
    };

    /// Derives flags from a stored profile. No profile means no access.
    pub fn from_profile(profile: Option<&profile::Model>) -> Self {
        match profile {
            Some(p) => {
                let is_verified = p.kyc_status == KycStatus::Approved;
                Self {
                    is_verified,
                    can_pickup: is_verified && p.total_bookings > 0,
                    is_first_time: p.total_bookings == 0,
                }
            }
            None => Self {
                is_verified: false,
                can_pickup: false,
                is_first_time: true,
            },
        }
    }
}

#[derive(Clone)]
pub struct EligibilityService {
    db_pool: Arc<DatabaseConnection>,
    demo_mode: bool,
    demo_user_prefix: String,
}

impl EligibilityService {
    pub fn new(db_pool: Arc<DatabaseConnection>, demo_mode: bool, demo_user_prefix: String) -> Self {
        Self {
            db_pool,
            demo_mode,
            demo_user_prefix,
        }
    }

    fn is_demo_user(&self, user_id: &str) -> bool {
        self.demo_mode
            || (!self.demo_user_prefix.is_empty() && user_id.starts_with(&self.demo_user_prefix))
    }

    /// Lookup errors propagate; they are not treated as "not eligible".
    #[instrument(skip(self))]
    pub async fn check(&self, user_id: &str) -> Result<Eligibility, ServiceError> {
        if self.is_demo_user(user_id) {
            debug!(user_id, "demo bypass");
            return Ok(Eligibility::UNRESTRICTED);
        }

        let profile = profile::Entity::find_by_id(user_id.to_string())
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(Eligibility::from_profile(profile.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn profile(kyc_status: KycStatus, total_bookings: i32) -> profile::Model {
        profile::Model {
            id: "user-1".into(),
            email: None,
            full_name: None,
            phone: None,
            kyc_status,
            total_bookings,
            xp: 0,
            role: profile::UserRole::Customer,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn missing_profile_fails_closed() {
        let e = Eligibility::from_profile(None);
        assert!(!e.is_verified);
        assert!(!e.can_pickup);
        assert!(e.is_first_time);
    }

    #[test]
    fn approved_returning_customer_may_pick_up() {
        let e = Eligibility::from_profile(Some(&profile(KycStatus::Approved, 2)));
        assert_eq!(
            e,
            Eligibility {
                is_verified: true,
                can_pickup: true,
                is_first_time: false
            }
        );
    }

    #[test]
    fn approved_first_timer_cannot_pick_up() {
        let e = Eligibility::from_profile(Some(&profile(KycStatus::Approved, 0)));
        assert!(e.is_verified);
        assert!(!e.can_pickup);
        assert!(e.is_first_time);
    }

    fn kyc_strategy() -> impl Strategy<Value = KycStatus> {
        prop_oneof![
            Just(KycStatus::Approved),
            Just(KycStatus::Pending),
            Just(KycStatus::Rejected),
            Just(KycStatus::NotSubmitted),
        ]
    }

    proptest! {
        #[test]
        fn unapproved_is_never_verified(kyc in kyc_strategy(), bookings in 0i32..50) {
            let e = Eligibility::from_profile(Some(&profile(kyc, bookings)));
            if kyc != KycStatus::Approved {
                prop_assert!(!e.is_verified);
                prop_assert!(!e.can_pickup);
            }
            if bookings == 0 {
                prop_assert!(e.is_first_time);
                prop_assert!(!e.can_pickup);
            }
        }
    }
}
