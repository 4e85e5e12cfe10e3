//! Webhook subscriptions, deliveries, and the event envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Booking-state change events subscribers can receive.
///
/// Closed enum with stable wire names; dispatch is an exhaustive match, not
/// a string-keyed handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "booking.created")]
    BookingCreated,
    #[serde(rename = "booking.cancelled")]
    BookingCancelled,
}

impl WebhookEvent {
    pub fn wire_name(&self) -> &'static str {
        match self {
            WebhookEvent::BookingCreated => "booking.created",
            WebhookEvent::BookingCancelled => "booking.cancelled",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "booking.created" => Some(WebhookEvent::BookingCreated),
            "booking.cancelled" => Some(WebhookEvent::BookingCancelled),
            _ => None,
        }
    }
}

/// A registered webhook subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub owner_id: String,
    pub url: String,
    pub events: Vec<WebhookEvent>,
    /// HMAC-SHA256 signing secret
    #[serde(skip_serializing)]
    pub secret: String,
    pub active: bool,
}

impl Webhook {
    pub fn subscribes_to(&self, event: WebhookEvent) -> bool {
        self.events.contains(&event)
    }
}

/// Delivery attempt lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Failed,
}

/// One queued webhook delivery.
///
/// `payload` holds the exact byte-serialization that will be signed and sent;
/// it is snapshotted at enqueue time so retries deliver identical bodies.
/// Delivery rows are never deleted (audit trail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: String,
    pub webhook_id: String,
    pub event: WebhookEvent,
    pub payload: String,
    pub status: DeliveryStatus,
    pub response_code: Option<u16>,
    pub attempts: u32,
    /// Earliest instant the next attempt may run; persisted so pending
    /// retries survive process restarts.
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// JSON envelope POSTed to subscribers: `{event, timestamp, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: WebhookEvent,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}
