//! Integration tests for the booking pipeline.
//!
//! These tests exercise the full validate/reserve/issue flow against the
//! in-memory inventory store, including the concurrency guarantees around
//! capacity.

use std::sync::Arc;
use std::time::Duration;

use booking::{BookingError, BookingRequest, BookingService, ErrorKind, RetryPolicy};
use booking::{RandomTokenGenerator, TOKEN_LENGTH};
use common::{EventId, Money, TierId};
use inventory_store::{Event, InMemoryInventoryStore, InventoryStore, TicketTier, Version};

const EVENT_ID: &str = "evt-rustconf";
const TIER_ID: &str = "tier-ga";
const PRICE_CENTS: i64 = 9900;

fn sample_event(capacity: u32) -> Event {
    Event::new(
        EVENT_ID,
        "RustConf 2026",
        vec![TicketTier::new(
            TIER_ID,
            Money::from_cents(PRICE_CENTS),
            capacity,
        )],
    )
}

async fn seeded_service(capacity: u32) -> (BookingService<InMemoryInventoryStore>, InMemoryInventoryStore) {
    let store = InMemoryInventoryStore::new();
    let service = BookingService::new(store.clone());
    service.create_event(sample_event(capacity)).await.unwrap();
    (service, store)
}

fn request_for(user: &str, quantity: i64) -> BookingRequest {
    BookingRequest {
        event_id: EVENT_ID.to_string(),
        event_title: "RustConf 2026".to_string(),
        user_id: user.to_string(),
        ticket_tier_id: TIER_ID.to_string(),
        quantity,
        total_price_cents: PRICE_CENTS * quantity,
    }
}

async fn available(store: &InMemoryInventoryStore) -> u32 {
    store
        .get_event(&EventId::new(EVENT_ID))
        .await
        .unwrap()
        .unwrap()
        .event
        .tiers[0]
        .quantity_available
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn zero_quantity_is_rejected_before_any_store_access() {
        // No event exists, yet the error is a validation failure rather
        // than EventNotFound: invalid requests never reach the store.
        let service = BookingService::new(InMemoryInventoryStore::new());

        let err = service
            .create_booking(request_for("user-1", 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn negative_quantity_is_rejected() {
        let (service, _) = seeded_service(10).await;

        let err = service
            .create_booking(request_for("user-1", -3))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn all_violations_are_reported_together() {
        let (service, _) = seeded_service(10).await;

        let bad = BookingRequest {
            event_id: String::new(),
            event_title: String::new(),
            user_id: "  ".to_string(),
            ticket_tier_id: String::new(),
            quantity: 0,
            total_price_cents: -1,
        };

        let err = service.create_booking(bad).await.unwrap_err();
        match err {
            BookingError::Validation(validation) => {
                assert_eq!(validation.violations.len(), 6);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_request_passes_validation_and_books() {
        let (service, store) = seeded_service(10).await;

        let booking_id = service
            .create_booking(request_for("user-1", 2))
            .await
            .unwrap();
        assert!(store.get_booking(&booking_id).await.unwrap().is_some());
    }
}

mod reservation {
    use super::*;

    #[tokio::test]
    async fn booking_decrements_availability() {
        let (service, store) = seeded_service(10).await;

        service
            .create_booking(request_for("user-1", 4))
            .await
            .unwrap();

        assert_eq!(available(&store).await, 6);
    }

    #[tokio::test]
    async fn exact_capacity_drain_sells_out_the_tier() {
        let (service, store) = seeded_service(4).await;

        service
            .create_booking(request_for("user-1", 4))
            .await
            .unwrap();

        let event = store
            .get_event(&EventId::new(EVENT_ID))
            .await
            .unwrap()
            .unwrap()
            .event;
        assert!(event.tiers[0].is_sold_out());
        assert_eq!(event.tiers[0].capacity_total, 4);

        // The next seat is refused with the real remaining count.
        let err = service
            .create_booking(request_for("user-2", 1))
            .await
            .unwrap_err();
        match err {
            BookingError::InsufficientInventory { available, .. } => assert_eq!(available, 0),
            other => panic!("expected insufficient inventory, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn over_ask_leaves_state_untouched() {
        let (service, store) = seeded_service(5).await;

        let err = service
            .create_booking(request_for("user-1", 6))
            .await
            .unwrap_err();

        match err {
            BookingError::InsufficientInventory {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("expected insufficient inventory, got {other:?}"),
        }
        assert_eq!(available(&store).await, 5);
        assert_eq!(store.booking_count().await, 0);
        assert_eq!(store.ticket_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_event_is_reported() {
        let service = BookingService::new(InMemoryInventoryStore::new());

        let err = service
            .create_booking(request_for("user-1", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EventNotFound);
    }

    #[tokio::test]
    async fn unknown_tier_is_reported() {
        let (service, _) = seeded_service(10).await;

        let mut request = request_for("user-1", 1);
        request.ticket_tier_id = "tier-backstage".to_string();

        let err = service.create_booking(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TierNotFound);
    }

    #[tokio::test]
    async fn sequential_bookings_accumulate() {
        let (service, store) = seeded_service(10).await;

        service
            .create_booking(request_for("user-1", 3))
            .await
            .unwrap();
        service
            .create_booking(request_for("user-2", 2))
            .await
            .unwrap();

        assert_eq!(available(&store).await, 5);
        assert_eq!(store.booking_count().await, 2);
        assert_eq!(store.ticket_count().await, 5);

        // Each committed reservation advanced the document version.
        let versioned = store
            .get_event(&EventId::new(EVENT_ID))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(versioned.version, Version::new(3));
    }

    #[tokio::test]
    async fn booking_one_tier_preserves_the_others() {
        let store = InMemoryInventoryStore::new();
        let service = BookingService::new(store.clone());
        service
            .create_event(Event::new(
                EVENT_ID,
                "RustConf 2026",
                vec![
                    TicketTier::new(TIER_ID, Money::from_cents(PRICE_CENTS), 100),
                    TicketTier::new("tier-vip", Money::from_cents(24900), 20),
                ],
            ))
            .await
            .unwrap();

        service
            .create_booking(request_for("user-1", 10))
            .await
            .unwrap();

        let event = store
            .get_event(&EventId::new(EVENT_ID))
            .await
            .unwrap()
            .unwrap()
            .event;
        assert_eq!(event.tier(&TierId::new(TIER_ID)).unwrap().quantity_available, 90);
        assert_eq!(
            event.tier(&TierId::new("tier-vip")).unwrap().quantity_available,
            20
        );
    }
}

mod issuance {
    use super::*;

    #[tokio::test]
    async fn one_ticket_per_seat_with_distinct_tokens() {
        let (service, _) = seeded_service(10).await;

        let booking_id = service
            .create_booking(request_for("user-1", 5))
            .await
            .unwrap();
        let tickets = service.tickets_for_booking(&booking_id).await.unwrap();

        assert_eq!(tickets.len(), 5);
        let tokens: std::collections::HashSet<_> =
            tickets.iter().map(|t| t.redemption_token.as_str()).collect();
        assert_eq!(tokens.len(), 5);
    }

    #[tokio::test]
    async fn tickets_carry_their_booking_context() {
        let (service, _) = seeded_service(10).await;

        let booking_id = service
            .create_booking(request_for("user-7", 2))
            .await
            .unwrap();

        for ticket in service.tickets_for_booking(&booking_id).await.unwrap() {
            assert_eq!(ticket.booking_id, booking_id);
            assert_eq!(ticket.event_id.as_str(), EVENT_ID);
            assert_eq!(ticket.user_id.as_str(), "user-7");
            assert_eq!(ticket.ticket_tier_id.as_str(), TIER_ID);
            assert_eq!(ticket.redemption_token.len(), TOKEN_LENGTH);
            assert!(ticket.status.can_redeem());
        }
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn racing_for_the_last_seats_admits_exactly_one() {
        let (service, store) = seeded_service(5).await;
        let service = Arc::new(service);

        // Two buyers race for 3 of the 5 remaining seats; only one can win.
        let mut handles = Vec::new();
        for user in ["user-a", "user-b"] {
            let service = service.clone();
            let request = request_for(user, 3);
            handles.push(tokio::spawn(async move {
                service.create_booking(request).await
            }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(BookingError::InsufficientInventory { .. }) => insufficient += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);
        assert_eq!(available(&store).await, 2);
        assert_eq!(store.booking_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn capacity_is_never_oversold() {
        let (service, store) = seeded_service(5).await;
        let service = Arc::new(service);

        // 20 buyers for 5 seats.
        let mut handles = Vec::new();
        for n in 0..20 {
            let service = service.clone();
            let request = request_for(&format!("user-{n}"), 1);
            handles.push(tokio::spawn(async move {
                service.create_booking(request).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(BookingError::InsufficientInventory { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 5);
        assert_eq!(available(&store).await, 0);
        assert_eq!(store.booking_count().await, 5);
        assert_eq!(store.ticket_count().await, 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mixed_quantities_conserve_inventory() {
        let store = InMemoryInventoryStore::new();
        // Generous retry allowance so contention alone never fails a booking.
        let policy = RetryPolicy {
            max_attempts: 32,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            deadline: Duration::from_secs(30),
        };
        let service = Arc::new(BookingService::with_policy(
            store.clone(),
            RandomTokenGenerator,
            policy,
        ));
        service.create_event(sample_event(10)).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..12u32 {
            let quantity = i64::from(n % 3 + 1);
            let service = service.clone();
            let request = request_for(&format!("user-{n}"), quantity);
            handles.push(tokio::spawn(async move {
                (quantity, service.create_booking(request).await)
            }));
        }

        let mut sold: i64 = 0;
        for handle in handles {
            let (quantity, outcome) = handle.await.unwrap();
            match outcome {
                Ok(_) => sold += quantity,
                Err(BookingError::InsufficientInventory { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // Seats sold and seats remaining always add back up to capacity.
        assert!(sold <= 10);
        assert_eq!(i64::from(available(&store).await), 10 - sold);
        assert_eq!(store.ticket_count().await as i64, sold);
    }
}

mod atomicity {
    use super::*;

    #[tokio::test]
    async fn failed_commit_leaves_no_partial_state() {
        let (service, store) = seeded_service(10).await;
        store.fail_next_commit().await;

        let err = service
            .create_booking(request_for("user-1", 3))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        // Availability, bookings, and tickets are all as before.
        assert_eq!(available(&store).await, 10);
        assert_eq!(store.booking_count().await, 0);
        assert_eq!(store.ticket_count().await, 0);

        // The store recovers for the next request.
        service
            .create_booking(request_for("user-1", 3))
            .await
            .unwrap();
        assert_eq!(available(&store).await, 7);
    }
}
