//! Shared in-memory mocks for core integration tests
//!
//! Provides deterministic implementations of all core ports so the booking
//! engine can be exercised end to end without database dependencies.

pub mod calendar;
pub mod repositories;

#[allow(unused_imports)]
pub use calendar::StaticBusyCalendar;
#[allow(unused_imports)]
pub use repositories::{
    FixedEventTypes, InMemoryBookingStore, InMemoryDeliveryQueue, InMemoryTeamRepository,
    InMemoryWebhookRepository, StaticAvailability,
};
