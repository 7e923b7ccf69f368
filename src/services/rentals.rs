//! Back-office rental management.

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::console::{self, ConsoleStatus};
use crate::entities::rental::{self, PaymentStatus, RentalStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender, UnitStatusChange, UnitStatusFeed};
use crate::services::booking::ConsoleLocks;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentalFilter {
    pub status: Option<RentalStatus>,
    pub category: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverdueSweep {
    pub marked_overdue: u64,
    pub rental_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct RentalService {
    db_pool: Arc<DatabaseConnection>,
    locks: ConsoleLocks,
    event_sender: EventSender,
    stock_feed: UnitStatusFeed,
}

impl RentalService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        locks: ConsoleLocks,
        event_sender: EventSender,
        stock_feed: UnitStatusFeed,
    ) -> Self {
        Self {
            db_pool,
            locks,
            event_sender,
            stock_feed,
        }
    }

    /// Newest first. Returns the page and the total count.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: RentalFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<rental::Model>, u64), ServiceError> {
        let mut query = rental::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(rental::Column::Status.eq(status));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(rental::Column::UserId.eq(user_id));
        }
        if let Some(category) = filter.category {
            query = query
                .inner_join(console::Entity)
                .filter(console::Column::Category.eq(category));
        }

        let paginator = query
            .order_by_desc(rental::Column::CreatedAt)
            .paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<rental::Model, ServiceError> {
        rental::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Rental {} not found", id)))
    }

    /// `Pending` to `active`.
    pub async fn approve(&self, id: Uuid) -> Result<rental::Model, ServiceError> {
        self.transition(id, RentalStatus::Active).await
    }

    /// Ends the rental and returns the unit to stock.
    pub async fn complete(&self, id: Uuid) -> Result<rental::Model, ServiceError> {
        self.transition(id, RentalStatus::Completed).await
    }

    /// Cancels the rental; the unit returns to stock unless another live rental holds it.
    pub async fn cancel(&self, id: Uuid) -> Result<rental::Model, ServiceError> {
        self.transition(id, RentalStatus::Cancelled).await
    }

    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        id: Uuid,
        next: RentalStatus,
    ) -> Result<rental::Model, ServiceError> {
        let console_id = self.get(id).await?.console_id;
        let _guard = self.locks.acquire(console_id).await;
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        // re-read under the lock; an uncommitted txn rolls back on drop
        let current = rental::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Rental {} not found", id)))?;
        if !current.status.can_transition_to(next) {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot move rental from {} to {}",
                current.status, next
            )));
        }

        let mut active: rental::ActiveModel = current.clone().into();
        active.status = Set(next);
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let mut released = None;
        if !next.is_live() {
            let others = rental::Entity::find()
                .filter(rental::Column::ConsoleId.eq(current.console_id))
                .filter(rental::Column::Id.ne(id))
                .filter(rental::Column::Status.is_not_in(RentalStatus::RELEASED))
                .count(&txn)
                .await
                .map_err(ServiceError::db_error)?;

            let unit = console::Entity::find_by_id(current.console_id)
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?;

            match unit {
                Some(unit) if unit.status == ConsoleStatus::Rented && others == 0 => {
                    let mut unit: console::ActiveModel = unit.into();
                    unit.status = Set(ConsoleStatus::Active);
                    released = Some(unit.update(&txn).await.map_err(ServiceError::db_error)?);
                }
                Some(_) => {}
                None => warn!(console_id = %current.console_id, "rental references a missing console"),
            }
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(rental_id = %id, from = %current.status, to = %next, "rental status changed");
        if let Some(unit) = released.as_ref() {
            self.stock_feed.publish(UnitStatusChange::from(unit));
        }
        self.event_sender
            .send_or_log(Event::RentalStatusChanged {
                rental_id: id,
                user_id: updated.user_id.clone(),
                status: next.to_string(),
            });

        Ok(updated)
    }

    pub async fn update_payment(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<rental::Model, ServiceError> {
        let current = self.get(id).await?;
        let mut active: rental::ActiveModel = current.into();
        active.payment_status = Set(payment_status);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(rental_id = %id, payment_status = %payment_status, "payment status updated");
        Ok(updated)
    }

    /// Flags `active` rentals whose end date has passed.
    ///
    /// Each row is flipped with a conditional update, so a rental completed or
    /// cancelled after the scan is left alone.
    #[instrument(skip(self))]
    pub async fn mark_overdue(&self) -> Result<OverdueSweep, ServiceError> {
        let now = Utc::now();
        let late = rental::Entity::find()
            .filter(rental::Column::Status.eq(RentalStatus::Active))
            .filter(rental::Column::EndDate.lt(now))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let mut rental_ids = Vec::with_capacity(late.len());
        for rental in late {
            match self.flag_overdue(rental.id).await {
                Ok(true) => {
                    rental_ids.push(rental.id);
                    self.event_sender
                        .send_or_log(Event::RentalStatusChanged {
                            rental_id: rental.id,
                            user_id: rental.user_id,
                            status: RentalStatus::Overdue.to_string(),
                        });
                }
                Ok(false) => {
                    info!(rental_id = %rental.id, "rental left active state before sweep; skipped")
                }
                Err(e) => warn!(rental_id = %rental.id, error = %e, "failed to mark rental overdue"),
            }
        }

        info!(count = rental_ids.len(), "overdue sweep finished");
        Ok(OverdueSweep {
            marked_overdue: rental_ids.len() as u64,
            rental_ids,
        })
    }

    /// Moves one rental from `active` to `overdue`; false when it was no longer active.
    async fn flag_overdue(&self, id: Uuid) -> Result<bool, sea_orm::DbErr> {
        let result = rental::Entity::update_many()
            .col_expr(rental::Column::Status, Expr::value(RentalStatus::Overdue))
            .col_expr(rental::Column::UpdatedAt, Expr::value(Some(Utc::now())))
            .filter(rental::Column::Id.eq(id))
            .filter(rental::Column::Status.eq(RentalStatus::Active))
            .exec(&*self.db_pool)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
