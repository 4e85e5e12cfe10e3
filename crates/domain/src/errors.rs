//! Error types used throughout the booking engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Slotwise
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SlotwiseError {
    /// Event type, booking, or host does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested interval failed commit-time re-validation. The event
    /// type exists but the time does not; callers should re-query slots.
    #[error("Slot no longer available: {0}")]
    SlotUnavailable(String),

    /// Cancellation requested for a booking that is already cancelled
    #[error("Already cancelled: {0}")]
    AlreadyCancelled(String),

    /// Malformed date/time, unknown timezone, or inconsistent request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External calendar collaborator failed or timed out
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// Terminal webhook delivery failure. Recorded on the delivery row,
    /// never surfaced to the booking caller.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Slotwise operations
pub type Result<T> = std::result::Result<T, SlotwiseError>;
