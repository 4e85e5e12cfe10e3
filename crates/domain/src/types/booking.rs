//! Bookings and occupied intervals

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Booking lifecycle status.
///
/// `Completed` is derived at read time (confirmed and past its end) and is
/// never written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// Guest identity captured at booking time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub name: String,
    pub email: String,
    pub timezone: String,
}

/// A committed reservation against a specific host.
///
/// Even for team event types the booking references exactly one assigned
/// host; collective attendance is derived from the live team roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub event_type_id: String,
    pub host_id: String,
    pub guest: Guest,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    /// Links occurrences of a recurring series; a series is a set of linked
    /// occurrences cancellable together.
    pub recurrence_parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Status with `Completed` derived for confirmed bookings whose end has
    /// passed.
    pub fn effective_status(&self, now: DateTime<Utc>) -> BookingStatus {
        if self.status == BookingStatus::Confirmed && self.end < now {
            BookingStatus::Completed
        } else {
            self.status
        }
    }
}

/// Request payload for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub event_type_id: String,
    pub start: DateTime<Utc>,
    pub guest: Guest,
    pub recurrence_parent_id: Option<String>,
}

/// An occupied interval: either an internal booking inflated by its event
/// type's buffers, or externally-reported busy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Half-open interval overlap: `start < other.end && end > other.start`.
    pub fn overlaps(&self, other: &BusyInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Widen by buffer minutes on each side.
    pub fn inflated(&self, before_min: i64, after_min: i64) -> BusyInterval {
        BusyInterval {
            start: self.start - Duration::minutes(before_min),
            end: self.end + Duration::minutes(after_min),
        }
    }
}
