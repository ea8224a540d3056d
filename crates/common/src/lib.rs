//! Shared value types for the ticket booking system.
//!
//! Identifier newtypes and the [`Money`] amount live here so that both the
//! storage layer and the booking core can speak the same typed vocabulary.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{BookingId, EventId, TicketId, TierId, UserId};
