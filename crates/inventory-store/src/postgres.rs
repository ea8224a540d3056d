use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use common::{BookingId, EventId, Money, TicketId, TierId, UserId};

use crate::{
    Booking, Event, Result, StoreError, Ticket, TicketTier, Version, VersionedEvent,
    store::{InventoryStore, ReservationWrite, validate_reservation_write},
};

/// PostgreSQL-backed inventory store implementation.
///
/// Event documents live in the `events` table with their tier list as
/// JSONB and a `version` column; bookings and tickets are relational
/// tables keyed back to the event. A reservation commit is one
/// transaction whose event update is conditional on the version.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<VersionedEvent> {
        let tiers_json: serde_json::Value = row.try_get("tiers")?;
        let tiers: Vec<TicketTier> = serde_json::from_value(tiers_json)?;

        Ok(VersionedEvent {
            event: Event {
                id: EventId::new(row.try_get::<String, _>("id")?),
                title: row.try_get("title")?,
                tiers,
            },
            version: Version::new(row.try_get("version")?),
        })
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        Ok(Booking {
            id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_id: EventId::new(row.try_get::<String, _>("event_id")?),
            event_title: row.try_get("event_title")?,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            ticket_tier_id: TierId::new(row.try_get::<String, _>("ticket_tier_id")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_ticket(row: PgRow) -> Result<Ticket> {
        let status: String = row.try_get("status")?;

        Ok(Ticket {
            id: TicketId::new(row.try_get::<String, _>("id")?),
            booking_id: BookingId::from_uuid(row.try_get::<Uuid, _>("booking_id")?),
            event_id: EventId::new(row.try_get::<String, _>("event_id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            ticket_tier_id: TierId::new(row.try_get::<String, _>("ticket_tier_id")?),
            redemption_token: row.try_get("redemption_token")?,
            status: status.parse().map_err(StoreError::Backend)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn insert_event(&self, event: Event) -> Result<Version> {
        let tiers_json = serde_json::to_value(&event.tiers)?;
        let version = Version::first();

        sqlx::query(
            r#"
            INSERT INTO events (id, title, tiers, version)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.id.as_str())
        .bind(&event.title)
        .bind(&tiers_json)
        .bind(version.as_i64())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // A primary key violation means the event was already provisioned
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("events_pkey")
            {
                return StoreError::EventAlreadyExists(event.id.clone());
            }
            StoreError::Database(e)
        })?;

        Ok(version)
    }

    async fn get_event(&self, event_id: &EventId) -> Result<Option<VersionedEvent>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, title, tiers, version
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_event(row)?)),
            None => Ok(None),
        }
    }

    async fn commit_reservation(&self, write: ReservationWrite) -> Result<Version> {
        validate_reservation_write(&write).map_err(|e| StoreError::InvalidWrite(e.message))?;

        let new_version = write.expected_version.next();
        let tiers_json = serde_json::to_value(&write.event.tiers)?;

        let mut tx = self.pool.begin().await?;

        // Conditional write: only lands if nobody committed since our read.
        let updated = sqlx::query(
            r#"
            UPDATE events
            SET title = $2, tiers = $3, version = $4
            WHERE id = $1 AND version = $5
            "#,
        )
        .bind(write.event.id.as_str())
        .bind(&write.event.title)
        .bind(&tiers_json)
        .bind(new_version.as_i64())
        .bind(write.expected_version.as_i64())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM events WHERE id = $1")
                .bind(write.event.id.as_str())
                .fetch_optional(&mut *tx)
                .await?;
            let actual = Version::new(actual.unwrap_or(0));

            tracing::debug!(
                event_id = %write.event.id,
                expected = %write.expected_version,
                %actual,
                "reservation commit lost the version race"
            );

            // Dropping the transaction rolls it back.
            return Err(StoreError::VersionConflict {
                event_id: write.event.id.clone(),
                expected: write.expected_version,
                actual,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, event_id, event_title, user_id, ticket_tier_id, quantity, total_price_cents, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(write.booking.id.as_uuid())
        .bind(write.booking.event_id.as_str())
        .bind(&write.booking.event_title)
        .bind(write.booking.user_id.as_str())
        .bind(write.booking.ticket_tier_id.as_str())
        .bind(i64::from(write.booking.quantity))
        .bind(write.booking.total_price.cents())
        .bind(write.booking.created_at)
        .execute(&mut *tx)
        .await?;

        for ticket in &write.tickets {
            sqlx::query(
                r#"
                INSERT INTO tickets
                    (id, booking_id, event_id, user_id, ticket_tier_id, redemption_token, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(ticket.id.as_str())
            .bind(ticket.booking_id.as_uuid())
            .bind(ticket.event_id.as_str())
            .bind(ticket.user_id.as_str())
            .bind(ticket.ticket_tier_id.as_str())
            .bind(&ticket.redemption_token)
            .bind(ticket.status.as_str())
            .bind(ticket.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(new_version)
    }

    async fn get_booking(&self, booking_id: &BookingId) -> Result<Option<Booking>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, event_id, event_title, user_id, ticket_tier_id, quantity, total_price_cents, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_booking(row)?)),
            None => Ok(None),
        }
    }

    async fn tickets_for_booking(&self, booking_id: &BookingId) -> Result<Vec<Ticket>> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_id, event_id, user_id, ticket_tier_id, redemption_token, status, created_at
            FROM tickets
            WHERE booking_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_ticket).collect()
    }

    async fn tickets_for_event(&self, event_id: &EventId) -> Result<Vec<Ticket>> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_id, event_id, user_id, ticket_tier_id, redemption_token, status, created_at
            FROM tickets
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(event_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_ticket).collect()
    }
}
