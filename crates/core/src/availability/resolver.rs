//! Availability resolver - open windows for one owner and date

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use slotwise_domain::{Result, TimeWindow};
use tracing::debug;

use super::ports::AvailabilityRepository;

/// Resolves the set of open wall-clock windows for an owner on a date.
///
/// Override-first: a blocked override empties the day regardless of weekly
/// rules (holiday blocking is a generated override); a custom-hours override
/// replaces the weekly rules for that date only. Without an override, each
/// matching weekly rule contributes one window. Windows may be contiguous or
/// disjoint; no merging is performed.
pub struct AvailabilityResolver {
    repository: Arc<dyn AvailabilityRepository>,
}

impl AvailabilityResolver {
    pub fn new(repository: Arc<dyn AvailabilityRepository>) -> Self {
        Self { repository }
    }

    /// Resolve the open windows for `owner_id` on `date`, ordered by start.
    ///
    /// An empty list means "unavailable that day" and is not an error; a date
    /// with zero rules and zero override is unavailable, not always open.
    pub async fn resolve(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<TimeWindow>> {
        if let Some(ovr) = self.repository.override_for_date(owner_id, date).await? {
            if !ovr.is_available {
                debug!(owner_id, %date, "date blocked by override");
                return Ok(Vec::new());
            }
            if let (Some(start), Some(end)) = (ovr.start_time, ovr.end_time) {
                return Ok(vec![TimeWindow::new(start, end)]);
            }
            // Available override without custom hours falls through to the
            // weekly rules (it only lifts a previous block).
        }

        let weekday = date.weekday().num_days_from_monday() as u8;
        let mut windows: Vec<TimeWindow> = self
            .repository
            .rules_for_weekday(owner_id, weekday)
            .await?
            .into_iter()
            .map(|rule| TimeWindow::new(rule.start_time, rule.end_time))
            .collect();
        windows.sort_by_key(|w| w.start);

        Ok(windows)
    }
}
