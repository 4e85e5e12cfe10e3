//! SQLite-backed implementations of the core repository ports

mod availability_repository;
mod booking_repository;
mod delivery_repository;
mod event_type_repository;
mod pool;
mod schema;
mod team_repository;
mod webhook_repository;

pub use availability_repository::SqliteAvailabilityRepository;
pub use booking_repository::SqliteBookingRepository;
pub use delivery_repository::SqliteDeliveryQueue;
pub use event_type_repository::SqliteEventTypeRepository;
pub use pool::SqlitePool;
pub use schema::migrate;
pub use team_repository::SqliteTeamRepository;
pub use webhook_repository::SqliteWebhookRepository;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use slotwise_domain::{Result, SlotwiseError};

/// Wall-clock times are stored as `HH:MM:SS` text.
pub(crate) fn parse_time(text: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .map_err(|e| SlotwiseError::Database(format!("malformed time column '{text}': {e}")))
}

/// Dates are stored as `YYYY-MM-DD` text.
pub(crate) fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| SlotwiseError::Database(format!("malformed date column '{text}': {e}")))
}

/// Instants are stored as unix epoch seconds.
pub(crate) fn from_epoch(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| SlotwiseError::Database(format!("timestamp {secs} out of range")))
}
