//! Durable inventory storage for the ticket booking system.
//!
//! An event document owns an ordered list of ticket tiers with capacity
//! counters. The reservation engine reads a document at a version and
//! commits the decremented document together with the new booking and its
//! tickets in one atomic, version-checked write; a commit that lost the
//! race fails whole with [`StoreError::VersionConflict`]. Two backends
//! implement the contract: [`InMemoryInventoryStore`] for tests and
//! [`PostgresInventoryStore`] for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use records::{Booking, Event, Ticket, TicketStatus, TicketTier, Version, VersionedEvent};
pub use store::{
    InventoryStore, ReservationWrite, WriteValidationError, validate_reservation_write,
};
