//! Port interfaces for availability data
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use slotwise_domain::{AvailabilityRule, DateOverride, Result};

/// Trait for reading an owner's weekly rules and date overrides
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Get every rule for the owner matching the given weekday (0 = Monday)
    async fn rules_for_weekday(
        &self,
        owner_id: &str,
        weekday: u8,
    ) -> Result<Vec<AvailabilityRule>>;

    /// Get the override for the exact date, if one exists
    async fn override_for_date(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DateOverride>>;
}
