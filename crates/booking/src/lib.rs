//! Booking pipeline for the ticket inventory system.
//!
//! A booking request flows through three stages: the validator
//! ([`request::validate`]) turns wire input into typed, checked data; the
//! [`ReservationEngine`] loads the event, checks capacity, and commits the
//! decrement with optimistic concurrency control, retrying lost version
//! races; the [`TicketIssuer`] mints one ticket per reserved seat inside
//! the same atomic commit. [`BookingService`] wires the stages together
//! behind a single facade.

pub mod engine;
pub mod error;
pub mod issuer;
pub mod request;
pub mod service;

pub use engine::{ReservationEngine, RetryPolicy};
pub use error::{BookingError, ErrorKind};
pub use issuer::{RandomTokenGenerator, TicketIssuer, TokenGenerator, TOKEN_LENGTH};
pub use request::{
    validate, BookingRequest, FieldViolation, ValidatedRequest, ValidationError,
};
pub use service::BookingService;
