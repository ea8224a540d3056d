use std::collections::HashSet;

use async_trait::async_trait;

use common::{BookingId, EventId};

use crate::error::Result;
use crate::records::{Booking, Event, Ticket, Version, VersionedEvent};

/// Everything one reservation writes, committed as a single atomic unit.
///
/// The engine reads an event document at some version, decrements the
/// chosen tier on its private copy, builds the booking and its tickets,
/// and hands the whole bundle here. The store applies all of it or none
/// of it; the event write only lands if the document is still at
/// `expected_version`.
#[derive(Debug, Clone)]
pub struct ReservationWrite {
    /// Version the event document was read at.
    pub expected_version: Version,
    /// The event document with the tier counter already decremented.
    pub event: Event,
    /// The booking created by this reservation.
    pub booking: Booking,
    /// One ticket per purchased seat.
    pub tickets: Vec<Ticket>,
}

/// Error returned when a reservation write is internally inconsistent.
#[derive(Debug, Clone)]
pub struct WriteValidationError {
    pub message: String,
}

impl std::fmt::Display for WriteValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for WriteValidationError {}

/// Checks that a reservation write hangs together before it hits a backend.
///
/// Backends call this first so that a buggy caller cannot persist a booking
/// whose tickets disagree with it. The checks are purely structural; the
/// version race is the backend's job.
pub fn validate_reservation_write(
    write: &ReservationWrite,
) -> std::result::Result<(), WriteValidationError> {
    if write.tickets.is_empty() {
        return Err(WriteValidationError {
            message: "reservation carries no tickets".to_string(),
        });
    }

    if write.tickets.len() != write.booking.quantity as usize {
        return Err(WriteValidationError {
            message: format!(
                "booking quantity is {} but {} tickets were supplied",
                write.booking.quantity,
                write.tickets.len()
            ),
        });
    }

    if write.booking.event_id != write.event.id {
        return Err(WriteValidationError {
            message: format!(
                "booking references event {} but the write is for event {}",
                write.booking.event_id, write.event.id
            ),
        });
    }

    if write.event.tier(&write.booking.ticket_tier_id).is_none() {
        return Err(WriteValidationError {
            message: format!(
                "booking references tier {} which is missing from event {}",
                write.booking.ticket_tier_id, write.event.id
            ),
        });
    }

    let mut seen = HashSet::new();
    for ticket in &write.tickets {
        if ticket.booking_id != write.booking.id {
            return Err(WriteValidationError {
                message: format!(
                    "ticket {} belongs to booking {} instead of {}",
                    ticket.id, ticket.booking_id, write.booking.id
                ),
            });
        }
        if ticket.event_id != write.booking.event_id
            || ticket.ticket_tier_id != write.booking.ticket_tier_id
        {
            return Err(WriteValidationError {
                message: format!(
                    "ticket {} disagrees with its booking's event or tier",
                    ticket.id
                ),
            });
        }
        if !seen.insert(ticket.id.clone()) {
            return Err(WriteValidationError {
                message: format!("duplicate ticket ID {} in reservation", ticket.id),
            });
        }
    }

    Ok(())
}

/// Trait defining inventory store operations.
///
/// Implementations must be thread-safe and support concurrent access.
/// The one write path, [`commit_reservation`](Self::commit_reservation),
/// is conditional on the event document's version; that conditionality is
/// what keeps concurrent purchases from overselling a tier.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Creates a new event document with its tier inventory.
    ///
    /// The document starts at [`Version::first`]. Fails with
    /// [`StoreError::EventAlreadyExists`](crate::StoreError::EventAlreadyExists)
    /// if the ID is taken; provisioning never overwrites live inventory.
    async fn insert_event(&self, event: Event) -> Result<Version>;

    /// Fetches an event document together with its current version.
    ///
    /// Returns `None` if no event with this ID exists.
    async fn get_event(&self, event_id: &EventId) -> Result<Option<VersionedEvent>>;

    /// Atomically applies every write of one reservation.
    ///
    /// The event document is replaced only if it is still at
    /// `write.expected_version`; the booking and tickets are inserted in
    /// the same transaction. If the version moved, the whole commit fails
    /// with [`StoreError::VersionConflict`](crate::StoreError::VersionConflict)
    /// and no partial effects remain.
    ///
    /// Returns the version the event document was advanced to.
    async fn commit_reservation(&self, write: ReservationWrite) -> Result<Version>;

    /// Fetches a booking by ID. Returns `None` if it does not exist.
    async fn get_booking(&self, booking_id: &BookingId) -> Result<Option<Booking>>;

    /// Lists the tickets issued for a booking.
    async fn tickets_for_booking(&self, booking_id: &BookingId) -> Result<Vec<Ticket>>;

    /// Lists every ticket issued for an event, across all bookings.
    async fn tickets_for_event(&self, event_id: &EventId) -> Result<Vec<Ticket>>;
}
