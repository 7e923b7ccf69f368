use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::console::{self, ConsoleStatus};
use crate::entities::rental::{self, RentalStatus};
use crate::errors::ServiceError;
use crate::events::{UnitStatusChange, UnitStatusFeed};
use crate::services::booking::ConsoleLocks;

/// Stock level for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryStock {
    pub category: String,
    /// Units currently `ACTIVE`
    pub available: u64,
    /// Units in rotation (everything but `RETIRED`)
    pub total: u64,
}

/// Groups units into per-category stock counts, sorted by category.
pub fn summarize_stock(units: &[console::Model]) -> Vec<CategoryStock> {
    let mut by_category: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for unit in units {
        let entry = by_category.entry(unit.category.as_str()).or_default();
        match unit.status {
            ConsoleStatus::Active => {
                entry.0 += 1;
                entry.1 += 1;
            }
            ConsoleStatus::Rented | ConsoleStatus::Maintenance => entry.1 += 1,
            ConsoleStatus::Retired => {}
        }
    }

    by_category
        .into_iter()
        .map(|(category, (available, total))| CategoryStock {
            category: category.to_string(),
            available,
            total,
        })
        .collect()
}

#[derive(Clone)]
pub struct ConsoleService {
    db_pool: Arc<DatabaseConnection>,
    locks: ConsoleLocks,
    stock_feed: UnitStatusFeed,
}

impl ConsoleService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        locks: ConsoleLocks,
        stock_feed: UnitStatusFeed,
    ) -> Self {
        Self {
            db_pool,
            locks,
            stock_feed,
        }
    }

    pub async fn list(&self, category: Option<String>) -> Result<Vec<console::Model>, ServiceError> {
        let mut query = console::Entity::find();
        if let Some(category) = category {
            query = query.filter(console::Column::Category.eq(category));
        }
        query
            .order_by_asc(console::Column::Category)
            .order_by_asc(console::Column::UnitId)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        unit_id: String,
        category: String,
        notes: Option<String>,
    ) -> Result<console::Model, ServiceError> {
        // the unique index on unit_id decides duplicates, even under concurrent creates
        let created = console::ActiveModel {
            unit_id: Set(unit_id.clone()),
            category: Set(category),
            status: Set(ConsoleStatus::Active),
            notes: Set(notes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict(format!("unit {} already exists", unit_id))
            }
            _ => ServiceError::db_error(e),
        })?;

        info!(unit_id = %created.unit_id, category = %created.category, "unit added");
        self.stock_feed.publish(UnitStatusChange::from(&created));
        Ok(created)
    }

    /// Manual status change for maintenance, retirement or reactivation.
    ///
    /// `RENTED` is owned by the booking flow and cannot be set here, and a unit
    /// with a live rental cannot be taken out from under it.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ConsoleStatus,
        notes: Option<String>,
    ) -> Result<console::Model, ServiceError> {
        if status == ConsoleStatus::Rented {
            return Err(ServiceError::InvalidOperation(
                "RENTED is set by bookings, not manually".to_string(),
            ));
        }

        let _guard = self.locks.acquire(id).await;
        let db = &*self.db_pool;

        let unit = console::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Console {} not found", id)))?;

        if unit.status == ConsoleStatus::Rented {
            let live = rental::Entity::find()
                .filter(rental::Column::ConsoleId.eq(id))
                .filter(rental::Column::Status.is_not_in(RentalStatus::RELEASED))
                .count(db)
                .await
                .map_err(ServiceError::db_error)?;
            if live > 0 {
                return Err(ServiceError::Conflict(format!(
                    "unit {} has {} live rental(s)",
                    unit.unit_id, live
                )));
            }
        }

        let mut active: console::ActiveModel = unit.into();
        active.status = Set(status);
        if notes.is_some() {
            active.notes = Set(notes);
        }
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(unit_id = %updated.unit_id, status = %updated.status, "unit status changed");
        self.stock_feed.publish(UnitStatusChange::from(&updated));
        Ok(updated)
    }

    pub async fn stock_summary(&self) -> Result<Vec<CategoryStock>, ServiceError> {
        let units = console::Entity::find()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(summarize_stock(&units))
    }
}
