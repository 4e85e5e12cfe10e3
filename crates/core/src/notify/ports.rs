//! Port interfaces for webhook subscriptions and the delivery queue

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_domain::{Result, Webhook, WebhookDelivery, WebhookEvent};

/// Trait for reading webhook subscriptions
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// Active webhooks of the owner subscribed to the event
    async fn active_subscriptions(
        &self,
        owner_id: &str,
        event: WebhookEvent,
    ) -> Result<Vec<Webhook>>;

    /// Look up a webhook by id (secret included)
    async fn find_webhook(&self, id: &str) -> Result<Option<Webhook>>;
}

/// Trait for the persistent delivery queue.
///
/// Rows are created at trigger time and mutated only as attempts complete;
/// they are never deleted (audit trail). `next_attempt_at` is persisted so
/// pending retries survive process restarts.
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    /// Create a pending delivery record
    async fn enqueue(&self, delivery: &WebhookDelivery) -> Result<()>;

    /// Pending deliveries whose `next_attempt_at` has passed
    async fn due_batch(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<WebhookDelivery>>;

    /// Terminal success: record the response code
    async fn mark_success(&self, id: &str, response_code: u16) -> Result<()>;

    /// Record a failed attempt. `next_attempt_at = Some(..)` reschedules the
    /// delivery; `None` makes the failure terminal.
    async fn mark_attempt_failed(
        &self,
        id: &str,
        error: &str,
        response_code: Option<u16>,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Audit query: all deliveries recorded for a webhook
    async fn deliveries_for_webhook(&self, webhook_id: &str) -> Result<Vec<WebhookDelivery>>;
}
