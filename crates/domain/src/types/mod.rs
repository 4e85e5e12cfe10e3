//! Domain types and models

pub mod availability;
pub mod booking;
pub mod event_type;
pub mod team;
pub mod webhook;

pub use availability::{AvailabilityRule, DateOverride, TimeWindow};
pub use booking::{Booking, BookingRequest, BookingStatus, BusyInterval, Guest};
pub use event_type::{EventType, SchedulingKind};
pub use team::TeamMember;
pub use webhook::{
    DeliveryStatus, EventEnvelope, Webhook, WebhookDelivery, WebhookEvent,
};
