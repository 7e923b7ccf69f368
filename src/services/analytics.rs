use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::entities::rental::{self, PaymentStatus};
use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaymentStatusTotal {
    pub payment_status: String,
    pub count: u64,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: Decimal,
    pub rentals: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaymentSummary {
    pub by_status: Vec<PaymentStatusTotal>,
    pub paid_by_month: Vec<MonthlyRevenue>,
    pub paid_revenue: Decimal,
    pub outstanding: Decimal,
}

/// Folds rentals into payment totals. Months are keyed by rental start date.
/// Sums saturate at `Decimal::MAX` rather than failing the report.
pub fn summarize_payments(rentals: &[rental::Model]) -> PaymentSummary {
    let mut by_status: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();
    let mut by_month: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();
    let mut paid_revenue = Decimal::ZERO;
    let mut outstanding = Decimal::ZERO;

    for r in rentals {
        let entry = by_status.entry(r.payment_status.to_string()).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(r.total_price);

        match r.payment_status {
            PaymentStatus::Paid => {
                paid_revenue = paid_revenue.saturating_add(r.total_price);
                let month = by_month
                    .entry(r.start_date.format("%Y-%m").to_string())
                    .or_default();
                month.0 += 1;
                month.1 = month.1.saturating_add(r.total_price);
            }
            PaymentStatus::Pending if r.status.is_live() => {
                outstanding = outstanding.saturating_add(r.total_price)
            }
            _ => {}
        }
    }

    PaymentSummary {
        by_status: by_status
            .into_iter()
            .map(|(payment_status, (count, total))| PaymentStatusTotal {
                payment_status,
                count,
                total,
            })
            .collect(),
        paid_by_month: by_month
            .into_iter()
            .map(|(month, (rentals, revenue))| MonthlyRevenue {
                month,
                revenue,
                rentals,
            })
            .collect(),
        paid_revenue,
        outstanding,
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn payment_summary(&self) -> Result<PaymentSummary, ServiceError> {
        let rentals = rental::Entity::find()
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(summarize_payments(&rentals))
    }
}
