use thiserror::Error;

use common::{EventId, TierId};
use inventory_store::StoreError;

use crate::request::ValidationError;

/// Machine-checkable classification of a booking failure.
///
/// Stable across releases; callers branch on this rather than parsing
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationFailed,
    EventNotFound,
    TierNotFound,
    InsufficientInventory,
    ReservationConflict,
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a string, as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "ValidationFailed",
            ErrorKind::EventNotFound => "EventNotFound",
            ErrorKind::TierNotFound => "TierNotFound",
            ErrorKind::InsufficientInventory => "InsufficientInventory",
            ErrorKind::ReservationConflict => "ReservationConflict",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by [`BookingService`](crate::BookingService) operations.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The request failed shape validation; nothing was read or written.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// No event exists with the requested ID.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The event exists but has no tier with the requested ID.
    #[error("Ticket tier not found: {tier_id} in event {event_id}")]
    TierNotFound { event_id: EventId, tier_id: TierId },

    /// The tier has fewer seats available than requested.
    #[error(
        "Insufficient inventory for tier {tier_id} in event {event_id}: requested {requested}, available {available}"
    )]
    InsufficientInventory {
        event_id: EventId,
        tier_id: TierId,
        requested: u32,
        available: u32,
    },

    /// The reservation kept losing the version race and gave up.
    #[error("Reservation for event {event_id} abandoned after {attempts} conflicting attempts")]
    ReservationConflict { event_id: EventId, attempts: u32 },

    /// The inventory store failed.
    #[error("Inventory store error: {0}")]
    Store(#[from] StoreError),
}

impl BookingError {
    /// Returns the stable classification of this error.
    ///
    /// Store-level failures that escape the engine (connection loss,
    /// serialization bugs) all classify as [`ErrorKind::Internal`]; a
    /// version conflict never escapes as a store error because the engine
    /// either retries it or converts it to
    /// [`BookingError::ReservationConflict`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation(_) => ErrorKind::ValidationFailed,
            BookingError::EventNotFound(_) => ErrorKind::EventNotFound,
            BookingError::TierNotFound { .. } => ErrorKind::TierNotFound,
            BookingError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            BookingError::ReservationConflict { .. } => ErrorKind::ReservationConflict,
            BookingError::Store(_) => ErrorKind::Internal,
        }
    }
}
