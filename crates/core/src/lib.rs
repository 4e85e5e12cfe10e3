//! # Slotwise Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The booking engine services (availability resolution, slot generation,
//!   conflict arbitration, team arbitration, booking commit, notification
//!   fan-out)
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `slotwise-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod availability;
pub mod booking;
pub mod conflict;
pub mod notify;
pub mod slots;
pub mod team;

// Re-export specific items to avoid ambiguity
pub use availability::ports::AvailabilityRepository;
pub use availability::AvailabilityResolver;
pub use booking::ports::{BookingStore, EventTypeRepository};
pub use booking::BookingService;
pub use conflict::ports::{BookingReadRepository, BusyCalendarPort};
pub use conflict::{CalendarFallback, ConflictChecker};
pub use notify::ports::{DeliveryQueue, WebhookRepository};
pub use notify::NotificationService;
pub use slots::{generate_slots, SlotQuery};
pub use team::ports::TeamRepository;
pub use team::TeamArbitrator;
