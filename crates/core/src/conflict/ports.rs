//! Port interfaces for conflict checking

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_domain::{BusyInterval, Result};

/// Read side of the booking store used during conflict checks.
#[async_trait]
pub trait BookingReadRepository: Send + Sync {
    /// Intervals of the host's pending/confirmed bookings intersecting the
    /// range, each inflated by that booking's own event-type buffers.
    async fn active_intervals(
        &self,
        host_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>>;
}

/// External calendar collaborator: busy time not originating from this
/// system's own booking records.
///
/// Implementations must return UTC instants and must distinguish errors from
/// "no busy time".
#[async_trait]
pub trait BusyCalendarPort: Send + Sync {
    async fn busy_intervals(
        &self,
        host_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>>;
}
