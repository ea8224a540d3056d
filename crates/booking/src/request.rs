use serde::{Deserialize, Serialize};

use common::{EventId, Money, TierId, UserId};

/// A raw booking request as supplied by the caller.
///
/// Field types are deliberately loose (plain strings, signed integers):
/// this is the shape that arrives over the wire. [`validate`] turns it
/// into a [`ValidatedRequest`] or reports every violated constraint at
/// once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub event_id: String,
    pub event_title: String,
    pub user_id: String,
    pub ticket_tier_id: String,
    pub quantity: i64,
    pub total_price_cents: i64,
}

/// A booking request that passed validation, with strongly typed fields.
///
/// Only this type reaches the reservation engine; the engine never has to
/// re-check shapes.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub event_id: EventId,
    pub event_title: String,
    pub user_id: UserId,
    pub ticket_tier_id: TierId,
    pub quantity: u32,
    pub total_price: Money,
}

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending request field.
    pub field: &'static str,
    /// What the constraint requires.
    pub message: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation failure carrying every violated constraint, not just the
/// first one found.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid booking request: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn require_non_empty(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: &str,
) {
    if value.trim().is_empty() {
        violations.push(FieldViolation {
            field,
            message: "must not be empty".to_string(),
        });
    }
}

/// Checks a booking request's shape before any storage work happens.
///
/// Pure function: no I/O, no side effects. A rejected request provably
/// never touched the inventory.
pub fn validate(request: &BookingRequest) -> Result<ValidatedRequest, ValidationError> {
    let mut violations = Vec::new();

    require_non_empty(&mut violations, "event_id", &request.event_id);
    require_non_empty(&mut violations, "event_title", &request.event_title);
    require_non_empty(&mut violations, "user_id", &request.user_id);
    require_non_empty(&mut violations, "ticket_tier_id", &request.ticket_tier_id);

    if request.quantity <= 0 {
        violations.push(FieldViolation {
            field: "quantity",
            message: "must be greater than 0".to_string(),
        });
    } else if request.quantity > i64::from(u32::MAX) {
        violations.push(FieldViolation {
            field: "quantity",
            message: format!("must be at most {}", u32::MAX),
        });
    }

    if request.total_price_cents < 0 {
        violations.push(FieldViolation {
            field: "total_price_cents",
            message: "must not be negative".to_string(),
        });
    }

    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    Ok(ValidatedRequest {
        event_id: EventId::new(request.event_id.as_str()),
        event_title: request.event_title.clone(),
        user_id: UserId::new(request.user_id.as_str()),
        ticket_tier_id: TierId::new(request.ticket_tier_id.as_str()),
        quantity: request.quantity as u32,
        total_price: Money::from_cents(request.total_price_cents),
    })
}
