//! Event provisioning and availability endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use booking::BookingError;
use common::{EventId, Money};
use inventory_store::{Event, InventoryStore, StoreError, TicketTier};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::bookings::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub id: String,
    pub title: String,
    pub tiers: Vec<TierRequest>,
}

#[derive(Deserialize)]
pub struct TierRequest {
    pub id: String,
    pub price_cents: i64,
    pub capacity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct EventCreatedResponse {
    pub event_id: String,
    pub version: i64,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub id: String,
    pub title: String,
    pub tiers: Vec<TierResponse>,
}

#[derive(Serialize)]
pub struct TierResponse {
    pub id: String,
    pub price_cents: i64,
    pub capacity_total: u32,
    pub quantity_available: u32,
}

// -- Handlers --

/// POST /events — provision an event with its ticket tiers.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(axum::http::StatusCode, Json<EventCreatedResponse>), ApiError> {
    if req.id.trim().is_empty() {
        return Err(ApiError::BadRequest("Event ID must not be empty".to_string()));
    }
    if req.tiers.is_empty() {
        return Err(ApiError::BadRequest(
            "An event needs at least one ticket tier".to_string(),
        ));
    }

    let tiers = req
        .tiers
        .iter()
        .map(|t| TicketTier::new(t.id.as_str(), Money::from_cents(t.price_cents), t.capacity))
        .collect();
    let event = Event::new(req.id.as_str(), req.title.as_str(), tiers);
    let event_id = event.id.clone();

    let version = match state.booking_service.create_event(event).await {
        Ok(version) => version,
        Err(BookingError::Store(StoreError::EventAlreadyExists(id))) => {
            return Err(ApiError::Conflict(format!("Event {id} already exists")));
        }
        Err(err) => return Err(err.into()),
    };

    let response = EventCreatedResponse {
        event_id: event_id.to_string(),
        version: version.as_i64(),
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /events/:id — current event state with per-tier availability.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let event_id = EventId::new(id.as_str());
    let event = state
        .booking_service
        .get_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {id} not found")))?;

    let tiers = event
        .tiers
        .iter()
        .map(|tier| TierResponse {
            id: tier.id.to_string(),
            price_cents: tier.price.cents(),
            capacity_total: tier.capacity_total,
            quantity_available: tier.quantity_available,
        })
        .collect();

    Ok(Json(EventResponse {
        id: event.id.to_string(),
        title: event.title,
        tiers,
    }))
}
