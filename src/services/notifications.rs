use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::notification;
use crate::errors::ServiceError;

/// In-app notifications written by the event worker.
#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        let mut query =
            notification::Entity::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::Read.eq(false));
        }
        query
            .order_by_desc(notification::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Someone else's notification is reported as missing.
    pub async fn mark_read(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<notification::Model, ServiceError> {
        let found = notification::Entity::find_by_id(id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Notification {} not found", id)))?;

        if found.read {
            return Ok(found);
        }

        let mut active: notification::ActiveModel = found.into();
        active.read = Set(true);
        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}
