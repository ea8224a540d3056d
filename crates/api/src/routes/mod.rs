//! HTTP route handlers.

pub mod bookings;
pub mod events;
pub mod health;
pub mod metrics;
