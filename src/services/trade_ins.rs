use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::trade_in::{self, TradeInStatus};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct NewTradeIn {
    pub user_id: Option<String>,
    pub customer_name: String,
    pub phone: String,
    pub device_category: String,
    pub condition: String,
}

/// Checks a trade-in update before it is written.
///
/// A quote needs a non-negative price, and nothing moves out of
/// `REJECTED` or `COMPLETED`.
pub fn validate_trade_in_update(
    current: TradeInStatus,
    next: TradeInStatus,
    offered_price: Option<Decimal>,
) -> Result<(), ServiceError> {
    if matches!(current, TradeInStatus::Rejected | TradeInStatus::Completed) && current != next {
        return Err(ServiceError::InvalidOperation(format!(
            "trade-in is already {}",
            current
        )));
    }
    if let Some(price) = offered_price {
        if price.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "offered price cannot be negative".to_string(),
            ));
        }
    }
    if next == TradeInStatus::Quoted && offered_price.is_none() {
        return Err(ServiceError::ValidationError(
            "a quote requires an offered price".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct TradeInService {
    db_pool: Arc<DatabaseConnection>,
}

impl TradeInService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(device_category = %input.device_category))]
    pub async fn create(&self, input: NewTradeIn) -> Result<trade_in::Model, ServiceError> {
        let created = trade_in::ActiveModel {
            user_id: Set(input.user_id),
            customer_name: Set(input.customer_name),
            phone: Set(input.phone),
            device_category: Set(input.device_category),
            condition: Set(input.condition),
            offered_price: Set(None),
            status: Set(TradeInStatus::Submitted),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(trade_in_id = %created.id, "trade-in submitted");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<trade_in::Model>, ServiceError> {
        trade_in::Entity::find()
            .order_by_desc(trade_in::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Sets the status and, optionally, the quoted price. A quote keeps the
    /// previously stored price when none is sent.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        status: TradeInStatus,
        offered_price: Option<Decimal>,
    ) -> Result<trade_in::Model, ServiceError> {
        let current = trade_in::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Trade-in {} not found", id)))?;

        let price = offered_price.or(current.offered_price);
        validate_trade_in_update(current.status, status, price)?;

        let mut active: trade_in::ActiveModel = current.into();
        active.status = Set(status);
        active.offered_price = Set(price);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        info!(trade_in_id = %id, %status, "trade-in updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn quote_without_price_is_rejected() {
        assert_matches!(
            validate_trade_in_update(TradeInStatus::Submitted, TradeInStatus::Quoted, None),
            Err(ServiceError::ValidationError(_))
        );
        assert!(validate_trade_in_update(
            TradeInStatus::Submitted,
            TradeInStatus::Quoted,
            Some(dec!(120))
        )
        .is_ok());
    }

    #[test]
    fn closed_trade_ins_stay_closed() {
        assert_matches!(
            validate_trade_in_update(TradeInStatus::Completed, TradeInStatus::Quoted, Some(dec!(1))),
            Err(ServiceError::InvalidOperation(_))
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        assert_matches!(
            validate_trade_in_update(TradeInStatus::Submitted, TradeInStatus::Quoted, Some(dec!(-5))),
            Err(ServiceError::ValidationError(_))
        );
    }
}
