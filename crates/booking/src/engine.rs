use std::time::{Duration, Instant};

use inventory_store::{
    Booking, InventoryStore, ReservationWrite, StoreError, VersionedEvent,
};

use crate::error::BookingError;
use crate::issuer::{TicketIssuer, TokenGenerator};
use crate::request::ValidatedRequest;

/// Bounds on the engine's conflict retry loop.
///
/// A version conflict means somebody else committed between our read and
/// our write, so retrying with fresh state can succeed. Retries are capped
/// by `max_attempts` and by the overall `deadline` so a heavily contended
/// tier cannot stall a caller indefinitely.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of reservation attempts, the first included.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles with each further attempt.
    pub base_delay: Duration,
    /// Upper bound on a single backoff sleep.
    pub max_delay: Duration,
    /// Wall-clock limit for one reservation, retries included.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(250),
            deadline: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Returns the backoff to sleep after the given failed attempt (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

/// Executes validated booking requests against the inventory store.
///
/// One attempt is: load the event document, locate the tier, check
/// capacity, decrement a private copy, build the booking and its tickets,
/// and commit everything conditional on the version the document was read
/// at. A lost version race restarts the attempt from the load; every
/// other failure is final.
pub struct ReservationEngine<S, G> {
    store: S,
    issuer: TicketIssuer<G>,
    policy: RetryPolicy,
}

impl<S, G> ReservationEngine<S, G>
where
    S: InventoryStore,
    G: TokenGenerator,
{
    /// Creates an engine with the default retry policy.
    pub fn new(store: S, generator: G) -> Self {
        Self::with_policy(store, generator, RetryPolicy::default())
    }

    /// Creates an engine with a custom retry policy.
    pub fn with_policy(store: S, generator: G, policy: RetryPolicy) -> Self {
        Self {
            store,
            issuer: TicketIssuer::new(generator),
            policy,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves seats for the request, retrying lost version races.
    ///
    /// Deterministic failures (unknown event or tier, insufficient
    /// inventory) return immediately; retrying them cannot change the
    /// outcome. Store failures other than a version conflict are
    /// propagated as-is.
    #[tracing::instrument(
        skip(self, request),
        fields(
            event_id = %request.event_id,
            tier_id = %request.ticket_tier_id,
            quantity = request.quantity,
        )
    )]
    pub async fn reserve(&self, request: &ValidatedRequest) -> Result<Booking, BookingError> {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.try_reserve(request).await {
                Ok(booking) => {
                    metrics::counter!("bookings_created_total").increment(1);
                    metrics::histogram!("reservation_duration_seconds")
                        .record(started.elapsed().as_secs_f64());
                    tracing::info!(booking_id = %booking.id, attempt, "reservation committed");
                    return Ok(booking);
                }
                Err(BookingError::Store(StoreError::VersionConflict { .. })) => {
                    metrics::counter!("reservation_conflicts_total").increment(1);

                    let delay = self.policy.delay_after(attempt);
                    if attempt >= self.policy.max_attempts
                        || started.elapsed() + delay >= self.policy.deadline
                    {
                        tracing::warn!(attempt, "reservation abandoned under contention");
                        return Err(BookingError::ReservationConflict {
                            event_id: request.event_id.clone(),
                            attempts: attempt,
                        });
                    }

                    tracing::debug!(attempt, ?delay, "version conflict, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One reservation attempt against the current state of the event
    /// document.
    async fn try_reserve(&self, request: &ValidatedRequest) -> Result<Booking, BookingError> {
        let VersionedEvent { mut event, version } = self
            .store
            .get_event(&request.event_id)
            .await?
            .ok_or_else(|| BookingError::EventNotFound(request.event_id.clone()))?;

        let tier = event
            .tier_mut(&request.ticket_tier_id)
            .ok_or_else(|| BookingError::TierNotFound {
                event_id: request.event_id.clone(),
                tier_id: request.ticket_tier_id.clone(),
            })?;

        // Check and decrement happen on the same snapshot; the conditional
        // commit below is what makes the pair safe under concurrency.
        if tier.quantity_available < request.quantity {
            metrics::counter!("insufficient_inventory_total").increment(1);
            tracing::warn!(
                available = tier.quantity_available,
                "insufficient inventory for reservation"
            );
            return Err(BookingError::InsufficientInventory {
                event_id: request.event_id.clone(),
                tier_id: request.ticket_tier_id.clone(),
                requested: request.quantity,
                available: tier.quantity_available,
            });
        }
        tier.quantity_available -= request.quantity;

        let booking = Booking::new(
            request.event_id.clone(),
            request.event_title.clone(),
            request.user_id.clone(),
            request.ticket_tier_id.clone(),
            request.quantity,
            request.total_price,
        );
        let tickets = self.issuer.issue(&booking);

        self.store
            .commit_reservation(ReservationWrite {
                expected_version: version,
                event,
                booking: booking.clone(),
                tickets,
            })
            .await?;

        Ok(booking)
    }
}
