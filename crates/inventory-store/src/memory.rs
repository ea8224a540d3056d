use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::{BookingId, EventId};

use crate::{
    Booking, Event, Result, StoreError, Ticket, Version, VersionedEvent,
    store::{InventoryStore, ReservationWrite, validate_reservation_write},
};

/// In-memory inventory store implementation for testing.
///
/// This implementation keeps all records in memory and provides the same
/// interface and atomicity guarantees as the PostgreSQL implementation:
/// the version check and every write of a reservation happen under a
/// single lock acquisition.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    events: HashMap<EventId, VersionedEvent>,
    bookings: HashMap<BookingId, Booking>,
    tickets: Vec<Ticket>,
    fail_next_commit: bool,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory inventory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `commit_reservation` call fail with a backend error,
    /// after its reads and validation have already succeeded. One-shot:
    /// the call after the failed one behaves normally again.
    pub async fn fail_next_commit(&self) {
        self.inner.write().await.fail_next_commit = true;
    }

    /// Returns the total number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.inner.read().await.bookings.len()
    }

    /// Returns the total number of tickets stored.
    pub async fn ticket_count(&self) -> usize {
        self.inner.read().await.tickets.len()
    }

    /// Clears all events, bookings and tickets.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.events.clear();
        inner.bookings.clear();
        inner.tickets.clear();
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert_event(&self, event: Event) -> Result<Version> {
        let mut inner = self.inner.write().await;

        if inner.events.contains_key(&event.id) {
            return Err(StoreError::EventAlreadyExists(event.id));
        }

        let version = Version::first();
        inner
            .events
            .insert(event.id.clone(), VersionedEvent { event, version });
        Ok(version)
    }

    async fn get_event(&self, event_id: &EventId) -> Result<Option<VersionedEvent>> {
        Ok(self.inner.read().await.events.get(event_id).cloned())
    }

    async fn commit_reservation(&self, write: ReservationWrite) -> Result<Version> {
        validate_reservation_write(&write).map_err(|e| StoreError::InvalidWrite(e.message))?;

        let mut inner = self.inner.write().await;

        if inner.fail_next_commit {
            inner.fail_next_commit = false;
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }

        // A document that vanished reads as version 0, which can never match
        // an expected version handed out by a successful read.
        let current = match inner.events.get(&write.event.id) {
            Some(versioned) => versioned.version,
            None => Version::initial(),
        };
        if current != write.expected_version {
            return Err(StoreError::VersionConflict {
                event_id: write.event.id.clone(),
                expected: write.expected_version,
                actual: current,
            });
        }

        let new_version = current.next();
        inner.events.insert(
            write.event.id.clone(),
            VersionedEvent {
                event: write.event,
                version: new_version,
            },
        );
        inner.bookings.insert(write.booking.id, write.booking);
        inner.tickets.extend(write.tickets);

        Ok(new_version)
    }

    async fn get_booking(&self, booking_id: &BookingId) -> Result<Option<Booking>> {
        Ok(self.inner.read().await.bookings.get(booking_id).cloned())
    }

    async fn tickets_for_booking(&self, booking_id: &BookingId) -> Result<Vec<Ticket>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tickets
            .iter()
            .filter(|ticket| ticket.booking_id == *booking_id)
            .cloned()
            .collect())
    }

    async fn tickets_for_event(&self, event_id: &EventId) -> Result<Vec<Ticket>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tickets
            .iter()
            .filter(|ticket| &ticket.event_id == event_id)
            .cloned()
            .collect())
    }
}
