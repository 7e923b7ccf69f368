use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A reservation binding a user, a console and a half-open date range.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rentals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub console_id: Uuid,
    #[sea_orm(nullable)]
    pub product_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub plan_id: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: RentalStatus,
    pub payment_status: PaymentStatus,
    pub total_price: Decimal,
    pub delivery_type: DeliveryType,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub addons: Option<Json>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Whether this rental still blocks its console for its window.
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::console::Entity",
        from = "Column::ConsoleId",
        to = "super::console::Column::Id"
    )]
    Console,
}

impl Related<super::console::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Console.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
            active_model.created_at = Set(now);
        }

        active_model.updated_at = Set(Some(now));
        Ok(active_model)
    }
}

/// Rental lifecycle. Stored spellings are kept as the back-office writes them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RentalStatus {
    #[sea_orm(string_value = "Pending")]
    #[serde(rename = "Pending", alias = "pending")]
    #[strum(serialize = "Pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    #[serde(rename = "active")]
    #[strum(serialize = "active")]
    Active,
    #[sea_orm(string_value = "overdue")]
    #[serde(rename = "overdue")]
    #[strum(serialize = "overdue")]
    Overdue,
    #[sea_orm(string_value = "completed")]
    #[serde(rename = "completed")]
    #[strum(serialize = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    #[serde(rename = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
}

impl RentalStatus {
    /// Statuses that no longer hold a console.
    pub const RELEASED: [RentalStatus; 2] = [RentalStatus::Cancelled, RentalStatus::Completed];

    pub fn is_live(&self) -> bool {
        !Self::RELEASED.contains(self)
    }

    /// Back-office transitions. Anything not listed is rejected.
    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        use RentalStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Cancelled)
                | (Active, Completed)
                | (Active, Overdue)
                | (Active, Cancelled)
                | (Overdue, Completed)
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "refunded")]
    Refunded,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeliveryType {
    #[default]
    #[sea_orm(string_value = "DELIVERY")]
    #[serde(alias = "delivery")]
    Delivery,
    #[sea_orm(string_value = "PICKUP")]
    #[serde(alias = "pickup")]
    Pickup,
}

/// One add-on line stored in the `addons` JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Addon {
    pub name: String,
    #[serde(default = "default_addon_quantity")]
    pub quantity: u32,
    pub price: Decimal,
}

fn default_addon_quantity() -> u32 {
    1
}
