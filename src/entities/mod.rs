pub mod console;
pub mod notification;
pub mod product;
pub mod profile;
pub mod rental;
pub mod service_booking;
pub mod trade_in;
