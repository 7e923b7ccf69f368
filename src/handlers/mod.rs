pub mod analytics;
pub mod availability;
pub mod bookings;
pub mod common;
pub mod consoles;
pub mod notifications;
pub mod rentals;
pub mod service_bookings;
pub mod stock;
pub mod trade_ins;
pub mod users;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::{EventSender, UnitStatusFeed};
use crate::services::{
    analytics::AnalyticsService, availability::AvailabilityService, booking::BookingService,
    booking::ConsoleLocks, consoles::ConsoleService, eligibility::EligibilityService,
    notifications::NotificationService, profiles::ProfileService, rentals::RentalService,
    service_bookings::ServiceBookingService, trade_ins::TradeInService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub availability: AvailabilityService,
    pub eligibility: EligibilityService,
    pub booking: BookingService,
    pub rentals: RentalService,
    pub consoles: ConsoleService,
    pub service_bookings: ServiceBookingService,
    pub trade_ins: TradeInService,
    pub analytics: AnalyticsService,
    pub notifications: NotificationService,
    pub profiles: ProfileService,
}

impl AppServices {
    /// Wires every service against one pool. Booking, rental lifecycle and
    /// console admin share the same per-unit locks.
    pub fn new(
        db_pool: Arc<DbPool>,
        config: &AppConfig,
        event_sender: EventSender,
        stock_feed: UnitStatusFeed,
    ) -> Self {
        let locks = ConsoleLocks::default();
        let availability = AvailabilityService::new(db_pool.clone());
        let eligibility = EligibilityService::new(
            db_pool.clone(),
            config.demo_mode,
            config.demo_user_prefix.clone(),
        );

        let booking = BookingService::new(
            db_pool.clone(),
            availability.clone(),
            eligibility.clone(),
            locks.clone(),
            event_sender.clone(),
            stock_feed.clone(),
            config.booking_max_attempts,
        );
        let rentals = RentalService::new(
            db_pool.clone(),
            locks.clone(),
            event_sender.clone(),
            stock_feed.clone(),
        );
        let consoles = ConsoleService::new(db_pool.clone(), locks, stock_feed);
        let profiles = ProfileService::new(db_pool.clone(), eligibility.clone(), event_sender);

        Self {
            availability,
            eligibility,
            booking,
            rentals,
            consoles,
            service_bookings: ServiceBookingService::new(db_pool.clone()),
            trade_ins: TradeInService::new(db_pool.clone()),
            analytics: AnalyticsService::new(db_pool.clone()),
            notifications: NotificationService::new(db_pool),
            profiles,
        }
    }
}
