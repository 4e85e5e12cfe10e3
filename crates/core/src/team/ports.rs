//! Port interfaces for team data

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_domain::{Result, TeamMember};

/// Trait for reading team rosters and assignment load
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Members eligible for the event type, ordered by `position` (join
    /// order) so selection stays deterministic.
    async fn members_for_event(&self, event_type_id: &str) -> Result<Vec<TeamMember>>;

    /// Number of non-cancelled bookings for this event type assigned to the
    /// member and starting at or after `since`. Load is measured by booking
    /// start, so upcoming assignments count toward it.
    async fn assignment_count_since(
        &self,
        event_type_id: &str,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64>;
}
