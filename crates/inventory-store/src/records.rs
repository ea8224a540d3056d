use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{BookingId, EventId, Money, TicketId, TierId, UserId};

/// Version number for an event document, used for optimistic concurrency control.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version with the given value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The version of a document that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// The version assigned to a freshly inserted document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A priced category of seats within an event, with its own capacity.
///
/// `quantity_available` counts down from `capacity_total` as reservations
/// commit; it never goes below zero and never exceeds `capacity_total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTier {
    pub id: TierId,
    pub price: Money,
    pub capacity_total: u32,
    pub quantity_available: u32,
}

impl TicketTier {
    /// Creates a tier with all of its capacity still available.
    pub fn new(id: impl Into<TierId>, price: Money, capacity: u32) -> Self {
        Self {
            id: id.into(),
            price,
            capacity_total: capacity,
            quantity_available: capacity,
        }
    }

    /// Returns true if no seats remain in this tier.
    pub fn is_sold_out(&self) -> bool {
        self.quantity_available == 0
    }

    /// Number of seats already sold.
    pub fn sold(&self) -> u32 {
        self.capacity_total - self.quantity_available
    }
}

/// An event document: the unit the reservation engine reads and writes.
///
/// Tiers are stored in insertion order and looked up by ID, so concurrent
/// writers always address the same tier regardless of how the list is
/// arranged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub tiers: Vec<TicketTier>,
}

impl Event {
    /// Creates a new event document.
    pub fn new(id: impl Into<EventId>, title: impl Into<String>, tiers: Vec<TicketTier>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tiers,
        }
    }

    /// Looks up a tier by ID.
    pub fn tier(&self, tier_id: &TierId) -> Option<&TicketTier> {
        self.tiers.iter().find(|tier| &tier.id == tier_id)
    }

    /// Looks up a tier by ID for mutation.
    pub fn tier_mut(&mut self, tier_id: &TierId) -> Option<&mut TicketTier> {
        self.tiers.iter_mut().find(|tier| &tier.id == tier_id)
    }
}

/// An event document paired with the version it was read at.
///
/// The version must be handed back on commit so the store can detect
/// writes that raced in between.
#[derive(Debug, Clone)]
pub struct VersionedEvent {
    pub event: Event,
    pub version: Version,
}

/// A committed purchase of tickets. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub event_id: EventId,
    pub event_title: String,
    pub user_id: UserId,
    pub ticket_tier_id: TierId,
    pub quantity: u32,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a booking with a fresh identifier and the current timestamp.
    pub fn new(
        event_id: EventId,
        event_title: impl Into<String>,
        user_id: UserId,
        ticket_tier_id: TierId,
        quantity: u32,
        total_price: Money,
    ) -> Self {
        Self {
            id: BookingId::new(),
            event_id,
            event_title: event_title.into(),
            user_id,
            ticket_tier_id,
            quantity,
            total_price,
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle of an issued ticket.
///
/// State machine: Valid -> Used (redeemed at the door) or Valid -> Void
/// (cancelled). Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TicketStatus {
    #[default]
    Valid,
    Used,
    Void,
}

impl TicketStatus {
    /// Returns true if the ticket can still be redeemed.
    pub fn can_redeem(&self) -> bool {
        matches!(self, TicketStatus::Valid)
    }

    /// Returns true if the ticket can still be voided.
    pub fn can_void(&self) -> bool {
        matches!(self, TicketStatus::Valid)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Used | TicketStatus::Void)
    }

    /// Returns the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Valid => "Valid",
            TicketStatus::Used => "Used",
            TicketStatus::Void => "Void",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Valid" => Ok(TicketStatus::Valid),
            "Used" => Ok(TicketStatus::Used),
            "Void" => Ok(TicketStatus::Void),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

/// A single admission right, issued one per purchased seat.
///
/// The redemption token doubles as the ticket's identifier; it is what
/// gets encoded into the QR code presented at the door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub booking_id: BookingId,
    pub event_id: EventId,
    pub user_id: UserId,
    pub ticket_tier_id: TierId,
    pub redemption_token: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Creates a valid ticket for the booking, keyed by its redemption token.
    pub fn new(token: impl Into<String>, booking: &Booking) -> Self {
        let token = token.into();
        Self {
            id: TicketId::new(token.clone()),
            booking_id: booking.id,
            event_id: booking.event_id.clone(),
            user_id: booking.user_id.clone(),
            ticket_tier_id: booking.ticket_tier_id.clone(),
            redemption_token: token,
            status: TicketStatus::Valid,
            created_at: Utc::now(),
        }
    }
}
