//! Booking orchestration and the reservation protocol.
//!
//! A booking runs the eligibility gate, asks the resolver for a unit and then
//! reserves it. Reservation holds a per-console async lock and, inside one
//! transaction, re-checks the unit before inserting the rental and flipping
//! the unit to `RENTED`. On Postgres the console row is also locked
//! `FOR UPDATE`, so separate processes serialize too. A lost race re-runs the
//! resolver up to the configured number of attempts.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::console::{self, ConsoleStatus};
use crate::entities::product;
use crate::entities::rental::{self, Addon, DeliveryType, PaymentStatus, RentalStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender, UnitStatusChange, UnitStatusFeed};
use crate::services::availability::{count_live_overlaps, AvailabilityService};
use crate::services::eligibility::EligibilityService;

/// One async mutex per console, shared by booking and release paths.
#[derive(Clone, Default)]
pub struct ConsoleLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ConsoleLocks {
    pub async fn acquire(&self, console_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .inner
            .entry(console_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

/// Contact fields supplied with a booking; folded into the rental notes.
#[derive(Debug, Clone, Default)]
pub struct ContactDetails {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
}

impl ContactDetails {
    fn as_note(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let mut parts = Vec::new();
        if !name.is_empty() {
            parts.push(format!("Contact: {}", name));
        }
        if let Some(mobile) = self.mobile.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(format!("Mobile: {}", mobile.trim()));
        }
        if let Some(email) = self.email.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(format!("Email: {}", email.trim()));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// A validated booking for an authenticated user.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub category: String,
    pub plan_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub addons: Vec<Addon>,
    pub contact: ContactDetails,
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: Uuid,
    pub console_id: Uuid,
    pub unit_id: String,
    pub total_price: Decimal,
}

/// Price when the client did not send one: daily rate per started day plus add-ons.
/// Overflow is reported as a validation error.
pub fn quote_total(
    daily_rate: Option<Decimal>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    addons: &[Addon],
) -> Result<Decimal, ServiceError> {
    let overflow = || ServiceError::ValidationError("booking total is too large".to_string());

    let seconds = (end - start).num_seconds().max(0);
    let days = (seconds + 86_399) / 86_400;
    let mut total = daily_rate
        .unwrap_or(Decimal::ZERO)
        .checked_mul(Decimal::from(days))
        .ok_or_else(overflow)?;
    for addon in addons {
        let line = addon
            .price
            .checked_mul(Decimal::from(addon.quantity))
            .ok_or_else(overflow)?;
        total = total.checked_add(line).ok_or_else(overflow)?;
    }
    Ok(total)
}

#[derive(Clone)]
pub struct BookingService {
    db_pool: Arc<DatabaseConnection>,
    availability: AvailabilityService,
    eligibility: EligibilityService,
    locks: ConsoleLocks,
    event_sender: EventSender,
    stock_feed: UnitStatusFeed,
    max_attempts: u32,
}

impl BookingService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        availability: AvailabilityService,
        eligibility: EligibilityService,
        locks: ConsoleLocks,
        event_sender: EventSender,
        stock_feed: UnitStatusFeed,
        max_attempts: u32,
    ) -> Self {
        Self {
            db_pool,
            availability,
            eligibility,
            locks,
            event_sender,
            stock_feed,
            max_attempts: max_attempts.max(1),
        }
    }

    #[instrument(skip(self, booking), fields(user_id = %booking.user_id, category = %booking.category))]
    pub async fn book(&self, booking: NewBooking) -> Result<BookingConfirmation, ServiceError> {
        let eligibility = self.eligibility.check(&booking.user_id).await?;
        if !eligibility.is_verified {
            counter!("console_rental.bookings.rejected", 1, "reason" => "kyc_required");
            return Err(ServiceError::KycRequired);
        }
        if booking.delivery_type == DeliveryType::Pickup && !eligibility.can_pickup {
            counter!("console_rental.bookings.rejected", 1, "reason" => "pickup_restricted");
            return Err(ServiceError::PickupRestricted);
        }

        let product = self.product_for(&booking.category).await;
        let total_price = match booking.total_amount {
            Some(total) => total,
            None => quote_total(
                product.as_ref().map(|p| p.daily_rate),
                booking.start,
                booking.end,
                &booking.addons,
            )?,
        };

        for attempt in 1..=self.max_attempts {
            let Some(console_id) = self
                .availability
                .find_available_console(&booking.category, booking.start, booking.end)
                .await
            else {
                break;
            };

            let reserved = self
                .reserve(console_id, &booking, product.as_ref().map(|p| p.id), total_price)
                .await?;

            match reserved {
                Some((rental, unit)) => {
                    counter!("console_rental.bookings.confirmed", 1);
                    info!(rental_id = %rental.id, unit_id = %unit.unit_id, attempt, "booking confirmed");

                    self.stock_feed.publish(UnitStatusChange::from(&unit));
                    self.event_sender
                        .send_or_log(Event::RentalBooked {
                            rental_id: rental.id,
                            user_id: rental.user_id.clone(),
                            console_id: unit.id,
                            category: unit.category.clone(),
                        });

                    return Ok(BookingConfirmation {
                        booking_id: rental.id,
                        console_id: unit.id,
                        unit_id: unit.unit_id,
                        total_price: rental.total_price,
                    });
                }
                None => {
                    counter!("console_rental.bookings.lost_race", 1);
                    warn!(%console_id, attempt, "unit taken before reservation; retrying");
                }
            }
        }

        counter!("console_rental.bookings.rejected", 1, "reason" => "no_availability");
        Err(ServiceError::NoAvailability(booking.category))
    }

    /// Reserves `console_id` for the booking, or returns `None` if it is no longer free.
    async fn reserve(
        &self,
        console_id: Uuid,
        booking: &NewBooking,
        product_id: Option<Uuid>,
        total_price: Decimal,
    ) -> Result<Option<(rental::Model, console::Model)>, ServiceError> {
        let _guard = self.locks.acquire(console_id).await;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        let mut query = console::Entity::find_by_id(console_id);
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        let unit = match query.one(&txn).await.map_err(ServiceError::db_error)? {
            Some(unit) if unit.status == ConsoleStatus::Active => unit,
            _ => {
                txn.rollback().await.map_err(ServiceError::db_error)?;
                return Ok(None);
            }
        };

        let overlapping = count_live_overlaps(&txn, console_id, booking.start, booking.end)
            .await
            .map_err(ServiceError::db_error)?;
        if overlapping > 0 {
            txn.rollback().await.map_err(ServiceError::db_error)?;
            return Ok(None);
        }

        let addons = if booking.addons.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&booking.addons).map_err(|e| {
                ServiceError::InternalError(format!("failed to encode addons: {}", e))
            })?)
        };

        let now = Utc::now();
        let rental = rental::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(booking.user_id.clone()),
            console_id: Set(console_id),
            product_id: Set(product_id),
            plan_id: Set(booking.plan_id.clone()),
            start_date: Set(booking.start),
            end_date: Set(booking.end),
            status: Set(RentalStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            total_price: Set(total_price),
            delivery_type: Set(booking.delivery_type),
            address: Set(booking.address.clone()),
            notes: Set(booking.contact.as_note()),
            addons: Set(addons),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut unit: console::ActiveModel = unit.into();
        unit.status = Set(ConsoleStatus::Rented);
        let unit = unit.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(Some((rental, unit)))
    }

    /// Catalogue entry for display and pricing; lookup failures are not fatal.
    async fn product_for(&self, category: &str) -> Option<product::Model> {
        match product::Entity::find()
            .filter(product::Column::Category.eq(category))
            .filter(product::Column::Active.eq(true))
            .order_by_asc(product::Column::Name)
            .limit(1)
            .one(&*self.db_pool)
            .await
        {
            Ok(product) => product,
            Err(e) => {
                warn!(category, error = %e, "product lookup failed");
                None
            }
        }
    }
}
