// Booking core
pub mod availability;
pub mod booking;
pub mod eligibility;

// Back office
pub mod analytics;
pub mod consoles;
pub mod rentals;
pub mod service_bookings;
pub mod trade_ins;

// Customer account
pub mod notifications;
pub mod profiles;
