use common::{BookingId, EventId};
use inventory_store::{Booking, Event, InventoryStore, Ticket, Version};

use crate::engine::{ReservationEngine, RetryPolicy};
use crate::error::BookingError;
use crate::issuer::{RandomTokenGenerator, TokenGenerator};
use crate::request::{BookingRequest, validate};

/// Facade over the booking pipeline: validate, reserve, issue.
///
/// This is the only surface callers need; the engine, issuer, and store
/// wiring live behind it.
pub struct BookingService<S, G = RandomTokenGenerator> {
    engine: ReservationEngine<S, G>,
}

impl<S> BookingService<S>
where
    S: InventoryStore,
{
    /// Creates a service issuing random redemption tokens.
    pub fn new(store: S) -> Self {
        Self {
            engine: ReservationEngine::new(store, RandomTokenGenerator),
        }
    }
}

impl<S, G> BookingService<S, G>
where
    S: InventoryStore,
    G: TokenGenerator,
{
    /// Creates a service with a custom token generator.
    pub fn with_generator(store: S, generator: G) -> Self {
        Self {
            engine: ReservationEngine::new(store, generator),
        }
    }

    /// Creates a service with a custom token generator and retry policy.
    pub fn with_policy(store: S, generator: G, policy: RetryPolicy) -> Self {
        Self {
            engine: ReservationEngine::with_policy(store, generator, policy),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        self.engine.store()
    }

    /// Validates the request and reserves the seats it asks for.
    ///
    /// Returns the ID of the created booking. Validation failures are
    /// rejected before any store I/O happens.
    #[tracing::instrument(
        skip(self, request),
        fields(
            event_id = %request.event_id,
            tier_id = %request.ticket_tier_id,
            quantity = request.quantity,
        )
    )]
    pub async fn create_booking(&self, request: BookingRequest) -> Result<BookingId, BookingError> {
        let validated = match validate(&request) {
            Ok(validated) => validated,
            Err(err) => {
                tracing::warn!(
                    violations = err.violations.len(),
                    "booking request failed validation"
                );
                return Err(err.into());
            }
        };

        let booking = self.engine.reserve(&validated).await?;
        Ok(booking.id)
    }

    /// Provisions a new event document with its tiers at full capacity.
    pub async fn create_event(&self, event: Event) -> Result<Version, BookingError> {
        tracing::info!(event_id = %event.id, tiers = event.tiers.len(), "creating event");
        Ok(self.engine.store().insert_event(event).await?)
    }

    /// Fetches an event's current state, availability included.
    pub async fn get_event(
        &self,
        event_id: &EventId,
    ) -> Result<Option<Event>, BookingError> {
        let versioned = self.engine.store().get_event(event_id).await?;
        Ok(versioned.map(|v| v.event))
    }

    /// Fetches a booking by ID.
    pub async fn get_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Booking>, BookingError> {
        Ok(self.engine.store().get_booking(booking_id).await?)
    }

    /// Fetches the tickets issued for a booking.
    pub async fn tickets_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Vec<Ticket>, BookingError> {
        Ok(self.engine.store().tickets_for_booking(booking_id).await?)
    }
}
