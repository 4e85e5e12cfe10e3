//! Bookable event-type templates

use serde::{Deserialize, Serialize};

/// Scheduling mode of an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulingKind {
    /// Single host owns the event type
    Individual,
    /// One available team member is assigned per booking
    RoundRobin,
    /// All team members must be simultaneously free
    Collective,
}

/// A bookable meeting template.
///
/// Immutable during a single slot query; mutated only by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventType {
    pub id: String,
    /// User id for individual events, team id for team events
    pub owner_id: String,
    pub title: String,
    /// IANA timezone the owner's wall-clock availability is anchored to
    pub timezone: String,
    pub duration_min: i64,
    pub buffer_before_min: i64,
    pub buffer_after_min: i64,
    pub min_notice_min: i64,
    pub max_days_ahead: i64,
    pub kind: SchedulingKind,
    /// When set, commits write `Pending` instead of `Confirmed` and the
    /// host approves out of band.
    pub requires_confirmation: bool,
    pub active: bool,
}

impl EventType {
    /// Step between candidate start times, in minutes.
    pub fn slot_step_min(&self) -> i64 {
        self.duration_min.min(crate::constants::SLOT_STEP_CAP_MIN)
    }
}
