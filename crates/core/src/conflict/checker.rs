//! Conflict checker with an explicit external-calendar fallback policy

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use slotwise_domain::{BusyInterval, Result};
use tracing::warn;

use super::ports::{BookingReadRepository, BusyCalendarPort};

/// What to do when the external calendar collaborator errors or times out.
///
/// The policy is applied uniformly: the same checker instance serves both the
/// read path (slot listing) and the commit-time re-validation, so the two
/// paths can never disagree about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarFallback {
    /// Treat the host as fully busy for the queried range. Safer against
    /// double-booking; the default.
    FailClosed,
    /// Treat the host as having no external conflicts.
    FailOpen,
}

/// Decides whether a candidate interval collides with existing bookings or
/// externally-reported busy time.
pub struct ConflictChecker {
    bookings: Arc<dyn BookingReadRepository>,
    calendar: Arc<dyn BusyCalendarPort>,
    fallback: CalendarFallback,
}

impl ConflictChecker {
    pub fn new(
        bookings: Arc<dyn BookingReadRepository>,
        calendar: Arc<dyn BusyCalendarPort>,
        fallback: CalendarFallback,
    ) -> Self {
        Self { bookings, calendar, fallback }
    }

    /// All occupied intervals for a host intersecting the range: internal
    /// buffer-inflated bookings plus external busy time, with the fallback
    /// policy applied to calendar failures.
    pub async fn occupied_for(
        &self,
        host_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let mut occupied =
            self.bookings.active_intervals(host_id, range_start, range_end).await?;

        match self.calendar.busy_intervals(host_id, range_start, range_end).await {
            Ok(external) => occupied.extend(external),
            Err(err) => match self.fallback {
                CalendarFallback::FailClosed => {
                    warn!(host_id, error = %err, "calendar lookup failed; treating host as busy");
                    occupied.push(BusyInterval::new(range_start, range_end));
                }
                CalendarFallback::FailOpen => {
                    warn!(host_id, error = %err, "calendar lookup failed; ignoring external busy time");
                }
            },
        }

        occupied.sort_by_key(|interval| interval.start);
        Ok(occupied)
    }

    /// True when the buffer-inflated candidate overlaps nothing for the host.
    pub async fn is_free(&self, host_id: &str, candidate: BusyInterval) -> Result<bool> {
        let occupied = self.occupied_for(host_id, candidate.start, candidate.end).await?;
        Ok(!occupied.iter().any(|busy| candidate.overlaps(busy)))
    }

    /// Per-host availability map for a team roster.
    ///
    /// For collective events any busy member disqualifies the slot; for
    /// round-robin a busy member disqualifies only that member.
    pub async fn free_map(
        &self,
        host_ids: &[String],
        candidate: BusyInterval,
    ) -> Result<HashMap<String, bool>> {
        let mut map = HashMap::with_capacity(host_ids.len());
        for host_id in host_ids {
            let free = self.is_free(host_id, candidate).await?;
            map.insert(host_id.clone(), free);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use slotwise_domain::SlotwiseError;

    use super::*;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
    }

    struct FixedBookings(Vec<(String, BusyInterval)>);

    #[async_trait]
    impl BookingReadRepository for FixedBookings {
        async fn active_intervals(
            &self,
            host_id: &str,
            range_start: DateTime<Utc>,
            range_end: DateTime<Utc>,
        ) -> Result<Vec<BusyInterval>> {
            let range = BusyInterval::new(range_start, range_end);
            Ok(self
                .0
                .iter()
                .filter(|(host, interval)| host == host_id && interval.overlaps(&range))
                .map(|(_, interval)| *interval)
                .collect())
        }
    }

    struct FixedCalendar {
        busy: Vec<BusyInterval>,
        fail: bool,
    }

    #[async_trait]
    impl BusyCalendarPort for FixedCalendar {
        async fn busy_intervals(
            &self,
            _host_id: &str,
            _range_start: DateTime<Utc>,
            _range_end: DateTime<Utc>,
        ) -> Result<Vec<BusyInterval>> {
            if self.fail {
                return Err(SlotwiseError::Upstream("calendar timeout".into()));
            }
            Ok(self.busy.clone())
        }
    }

    fn checker(
        bookings: Vec<(String, BusyInterval)>,
        calendar: FixedCalendar,
        fallback: CalendarFallback,
    ) -> ConflictChecker {
        ConflictChecker::new(Arc::new(FixedBookings(bookings)), Arc::new(calendar), fallback)
    }

    #[tokio::test]
    async fn internal_booking_blocks_candidate() {
        let checker = checker(
            vec![("host-1".into(), BusyInterval::new(ts(9, 0), ts(9, 30)))],
            FixedCalendar { busy: vec![], fail: false },
            CalendarFallback::FailClosed,
        );
        assert!(!checker.is_free("host-1", BusyInterval::new(ts(9, 15), ts(9, 45))).await.unwrap());
        assert!(checker.is_free("host-1", BusyInterval::new(ts(9, 30), ts(10, 0))).await.unwrap());
        assert!(checker.is_free("host-2", BusyInterval::new(ts(9, 0), ts(9, 30))).await.unwrap());
    }

    #[tokio::test]
    async fn external_busy_time_blocks_candidate() {
        let checker = checker(
            vec![],
            FixedCalendar { busy: vec![BusyInterval::new(ts(10, 0), ts(11, 0))], fail: false },
            CalendarFallback::FailClosed,
        );
        assert!(!checker.is_free("host-1", BusyInterval::new(ts(10, 30), ts(11, 0))).await.unwrap());
    }

    #[tokio::test]
    async fn fail_closed_treats_host_as_busy_on_calendar_error() {
        let checker = checker(
            vec![],
            FixedCalendar { busy: vec![], fail: true },
            CalendarFallback::FailClosed,
        );
        assert!(!checker.is_free("host-1", BusyInterval::new(ts(9, 0), ts(9, 30))).await.unwrap());
    }

    #[tokio::test]
    async fn fail_open_ignores_calendar_error() {
        let checker = checker(
            vec![],
            FixedCalendar { busy: vec![], fail: true },
            CalendarFallback::FailOpen,
        );
        assert!(checker.is_free("host-1", BusyInterval::new(ts(9, 0), ts(9, 30))).await.unwrap());
    }

    #[tokio::test]
    async fn free_map_reports_each_member_independently() {
        let checker = checker(
            vec![("host-2".into(), BusyInterval::new(ts(9, 0), ts(10, 0)))],
            FixedCalendar { busy: vec![], fail: false },
            CalendarFallback::FailClosed,
        );
        let hosts = vec!["host-1".to_string(), "host-2".to_string()];
        let map = checker.free_map(&hosts, BusyInterval::new(ts(9, 0), ts(9, 30))).await.unwrap();
        assert_eq!(map.get("host-1"), Some(&true));
        assert_eq!(map.get("host-2"), Some(&false));
    }
}
