//! Candidate slot generation
//!
//! Pure and deterministic: identical inputs (including the same `now`)
//! produce identical output, because the read path and the commit-time
//! re-validation must agree on what is bookable.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use slotwise_domain::{BusyInterval, EventType, TimeWindow};

/// Inputs for generating the bookable start times of one date.
#[derive(Debug, Clone)]
pub struct SlotQuery<'a> {
    /// Resolved wall-clock windows for `date`
    pub windows: &'a [TimeWindow],
    pub date: NaiveDate,
    /// Timezone the windows are anchored to
    pub timezone: Tz,
    pub event_type: &'a EventType,
    pub now: DateTime<Utc>,
    /// Already-occupied intervals, each inflated by its own booking's buffers
    pub occupied: &'a [BusyInterval],
}

/// Convert a wall-clock time on a date to a UTC instant.
///
/// DST policy: ambiguous local times (fall-back) take the earliest mapping;
/// nonexistent local times (spring-forward gap) yield `None` and the caller
/// skips the candidate.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The interval a candidate start occupies once inflated by the event type's
/// buffers.
pub fn candidate_interval(event_type: &EventType, start: DateTime<Utc>) -> BusyInterval {
    BusyInterval::new(start, start + Duration::minutes(event_type.duration_min))
        .inflated(event_type.buffer_before_min, event_type.buffer_after_min)
}

/// Generate the ascending list of valid candidate start times for one date.
///
/// Walks each window in steps of `min(duration, 30)` minutes. A candidate is
/// valid when it fits its window, satisfies min-notice, its date is within
/// the booking horizon, and its buffer-inflated interval overlaps nothing in
/// `occupied`. Empty output is a normal result, not an error.
pub fn generate_slots(query: &SlotQuery<'_>) -> Vec<DateTime<Utc>> {
    let event_type = query.event_type;
    // A non-positive duration would stall the cursor walk
    if event_type.duration_min <= 0 {
        return Vec::new();
    }
    let duration = Duration::minutes(event_type.duration_min);
    let step = Duration::minutes(event_type.slot_step_min());

    // Horizon and notice bounds are fixed for the whole query
    let local_today = query.now.with_timezone(&query.timezone).date_naive();
    let horizon = local_today + Duration::days(event_type.max_days_ahead);
    if query.date > horizon {
        return Vec::new();
    }
    let earliest_start = query.now + Duration::minutes(event_type.min_notice_min);

    let mut slots = Vec::new();
    for window in query.windows {
        let mut cursor = window.start;
        while cursor < window.end {
            // (a) the slot must fit inside its window; a wrap past midnight
            // never fits
            let (end_time, wrap) = cursor.overflowing_add_signed(duration);
            if wrap != 0 || end_time > window.end {
                break;
            }

            if let Some(start) = local_to_utc(query.date, cursor, query.timezone) {
                let valid = start >= earliest_start
                    && !candidate_interval(event_type, start).overlaps_any(query.occupied);
                if valid {
                    slots.push(start);
                }
            }

            let (next, wrap) = cursor.overflowing_add_signed(step);
            if wrap != 0 {
                break;
            }
            cursor = next;
        }
    }

    slots.sort_unstable();
    slots.dedup();
    slots
}

trait OverlapsAny {
    fn overlaps_any(&self, occupied: &[BusyInterval]) -> bool;
}

impl OverlapsAny for BusyInterval {
    fn overlaps_any(&self, occupied: &[BusyInterval]) -> bool {
        occupied.iter().any(|busy| self.overlaps(busy))
    }
}
