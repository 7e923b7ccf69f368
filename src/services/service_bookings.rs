use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::service_booking::{self, ServiceBookingStatus};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct NewServiceBooking {
    pub customer_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub device_category: String,
    pub issue: String,
    pub scheduled_for: Option<DateTime<Utc>>,
}

/// Repair intake and its back-office status updates.
#[derive(Clone)]
pub struct ServiceBookingService {
    db_pool: Arc<DatabaseConnection>,
}

impl ServiceBookingService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(device_category = %input.device_category))]
    pub async fn create(
        &self,
        input: NewServiceBooking,
    ) -> Result<service_booking::Model, ServiceError> {
        let created = service_booking::ActiveModel {
            customer_name: Set(input.customer_name),
            email: Set(input.email),
            phone: Set(input.phone),
            device_category: Set(input.device_category),
            issue: Set(input.issue),
            status: Set(ServiceBookingStatus::Pending),
            scheduled_for: Set(input.scheduled_for),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(service_booking_id = %created.id, "service booking received");
        Ok(created)
    }

    pub async fn list(
        &self,
        status: Option<ServiceBookingStatus>,
    ) -> Result<Vec<service_booking::Model>, ServiceError> {
        let mut query = service_booking::Entity::find();
        if let Some(status) = status {
            query = query.filter(service_booking::Column::Status.eq(status));
        }
        query
            .order_by_desc(service_booking::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Completed and cancelled bookings are final.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ServiceBookingStatus,
    ) -> Result<service_booking::Model, ServiceError> {
        let current = service_booking::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Service booking {} not found", id)))?;

        if current.status.is_terminal() && current.status != status {
            return Err(ServiceError::InvalidOperation(format!(
                "service booking is already {}",
                current.status
            )));
        }

        let mut active: service_booking::ActiveModel = current.into();
        active.status = Set(status);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(service_booking_id = %id, %status, "service booking updated");
        Ok(updated)
    }
}
