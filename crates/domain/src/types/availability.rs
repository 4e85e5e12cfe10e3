//! Availability rules, date overrides, and resolved time windows

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Weekly recurring availability rule.
///
/// Start and end are local wall-clock times, not absolute instants. Multiple
/// rules for the same owner and weekday are allowed (split shifts) and carry
/// union semantics; overlap between them is not validated away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: String,
    pub owner_id: String,
    /// 0 = Monday .. 6 = Sunday (`chrono::Weekday::num_days_from_monday`)
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Per-date exception to the weekly rules.
///
/// One override per (owner, date), upsert semantics. `is_available = false`
/// blocks the date entirely regardless of weekly rules; holiday blocking is
/// modeled as a generated override. `is_available = true` with custom times
/// replaces the weekly rules for that date only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateOverride {
    pub id: String,
    pub owner_id: String,
    pub date: NaiveDate,
    pub is_available: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// An open wall-clock window within a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}
