use thiserror::Error;

use common::EventId;

use crate::Version;

/// Errors that can occur when interacting with the inventory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event document changed between read and commit.
    /// The expected version did not match the actual version.
    #[error("Version conflict for event {event_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        event_id: EventId,
        expected: Version,
        actual: Version,
    },

    /// An event with this ID already exists.
    #[error("Event already exists: {0}")]
    EventAlreadyExists(EventId),

    /// The reservation write was internally inconsistent and was rejected
    /// before any backend work.
    #[error("Invalid reservation write: {0}")]
    InvalidWrite(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An opaque backend failure (injected failures, wrapped stores).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for inventory store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
