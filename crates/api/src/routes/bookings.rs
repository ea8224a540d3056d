//! Booking creation and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use booking::{BookingRequest, BookingService};
use common::BookingId;
use inventory_store::{Booking, InventoryStore, Ticket};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: InventoryStore> {
    pub booking_service: BookingService<S>,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub booking_id: String,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub event_id: String,
    pub event_title: String,
    pub user_id: String,
    pub ticket_tier_id: String,
    pub quantity: u32,
    pub total_price_cents: i64,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct TicketResponse {
    pub id: String,
    pub booking_id: String,
    pub event_id: String,
    pub ticket_tier_id: String,
    pub redemption_token: String,
    pub status: String,
    pub created_at: String,
}

impl BookingResponse {
    fn from_booking(booking: &Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            event_id: booking.event_id.to_string(),
            event_title: booking.event_title.clone(),
            user_id: booking.user_id.to_string(),
            ticket_tier_id: booking.ticket_tier_id.to_string(),
            quantity: booking.quantity,
            total_price_cents: booking.total_price.cents(),
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}

impl TicketResponse {
    fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.to_string(),
            booking_id: ticket.booking_id.to_string(),
            event_id: ticket.event_id.to_string(),
            ticket_tier_id: ticket.ticket_tier_id.to_string(),
            redemption_token: ticket.redemption_token.clone(),
            status: ticket.status.to_string(),
            created_at: ticket.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /bookings — reserve seats and issue tickets.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<BookingRequest>,
) -> Result<(axum::http::StatusCode, Json<BookingCreatedResponse>), ApiError> {
    let booking_id = state.booking_service.create_booking(req).await?;

    let response = BookingCreatedResponse {
        success: true,
        booking_id: booking_id.to_string(),
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /bookings/:id — load a booking by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state
        .booking_service
        .get_booking(&booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking {id} not found")))?;

    Ok(Json(BookingResponse::from_booking(&booking)))
}

/// GET /bookings/:id/tickets — list the tickets issued for a booking.
#[tracing::instrument(skip(state))]
pub async fn tickets<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let booking_id = parse_booking_id(&id)?;

    // Distinguish an unknown booking from a booking with no tickets.
    state
        .booking_service
        .get_booking(&booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Booking {id} not found")))?;

    let tickets = state
        .booking_service
        .tickets_for_booking(&booking_id)
        .await?;

    Ok(Json(tickets.iter().map(TicketResponse::from_ticket).collect()))
}

fn parse_booking_id(id: &str) -> Result<BookingId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid booking ID: {e}")))?;
    Ok(BookingId::from_uuid(uuid))
}
