//! Port interfaces for event types and the transactional booking store

use async_trait::async_trait;
use slotwise_domain::{Booking, BusyInterval, EventType, Result};

/// Trait for reading event-type templates
#[async_trait]
pub trait EventTypeRepository: Send + Sync {
    async fn find_event_type(&self, id: &str) -> Result<Option<EventType>>;
}

/// Transactional booking store.
///
/// Implementations must provide the storage-level exclusion guarantee: two
/// concurrent `insert_if_free` calls with overlapping intervals for a shared
/// host must not both succeed.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Atomically re-check the buffer-inflated interval against the active
    /// bookings of every host in `competing_hosts` and insert the booking.
    ///
    /// Returns `SlotUnavailable` when the overlap re-check fails; the caller
    /// must never substitute a different slot.
    async fn insert_if_free(
        &self,
        booking: &Booking,
        inflated: BusyInterval,
        competing_hosts: &[String],
    ) -> Result<()>;

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>>;

    /// Transition the booking to cancelled. Errors with `NotFound` for an
    /// unknown id and `AlreadyCancelled` for a repeated cancel.
    async fn cancel(&self, id: &str) -> Result<Booking>;

    /// Cancel every non-cancelled occurrence linked to the series parent,
    /// under the same serialization as single cancels. Returns the
    /// occurrences that were transitioned.
    async fn cancel_series(&self, parent_id: &str) -> Result<Vec<Booking>>;
}
