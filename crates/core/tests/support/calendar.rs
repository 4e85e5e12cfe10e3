//! Mock external calendar collaborator

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_core::BusyCalendarPort;
use slotwise_domain::{BusyInterval, Result, SlotwiseError};

/// In-memory `BusyCalendarPort` serving fixed busy intervals per host.
///
/// `failing()` builds a collaborator that always errors, for exercising the
/// fallback policy.
#[derive(Default)]
pub struct StaticBusyCalendar {
    busy: HashMap<String, Vec<BusyInterval>>,
    fail: bool,
}

impl StaticBusyCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { busy: HashMap::new(), fail: true }
    }

    pub fn with_busy(mut self, host_id: &str, interval: BusyInterval) -> Self {
        self.busy.entry(host_id.to_string()).or_default().push(interval);
        self
    }
}

#[async_trait]
impl BusyCalendarPort for StaticBusyCalendar {
    async fn busy_intervals(
        &self,
        host_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        if self.fail {
            return Err(SlotwiseError::Upstream("calendar collaborator down".into()));
        }
        let range = BusyInterval::new(range_start, range_end);
        Ok(self
            .busy
            .get(host_id)
            .map(|intervals| {
                intervals.iter().filter(|i| i.overlaps(&range)).copied().collect()
            })
            .unwrap_or_default())
    }
}
