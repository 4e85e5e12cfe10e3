//! Notification service - turns booking-state changes into queued deliveries

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use slotwise_domain::{
    DeliveryStatus, EventEnvelope, Result, SlotwiseError, WebhookDelivery, WebhookEvent,
};
use tracing::debug;
use uuid::Uuid;

use super::ports::{DeliveryQueue, WebhookRepository};

/// Fans a committed booking event out into one pending delivery per active
/// subscribed webhook.
///
/// The JSON envelope is serialized once here and snapshotted on each delivery
/// row, so every retry signs and sends the exact same bytes.
pub struct NotificationService {
    webhooks: Arc<dyn WebhookRepository>,
    queue: Arc<dyn DeliveryQueue>,
}

impl NotificationService {
    pub fn new(webhooks: Arc<dyn WebhookRepository>, queue: Arc<dyn DeliveryQueue>) -> Self {
        Self { webhooks, queue }
    }

    /// Enqueue deliveries for `event` to every subscribed webhook of the
    /// owner. Returns the number of deliveries created.
    pub async fn booking_event(
        &self,
        owner_id: &str,
        event: WebhookEvent,
        data: Value,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let subscriptions = self.webhooks.active_subscriptions(owner_id, event).await?;
        if subscriptions.is_empty() {
            debug!(owner_id, event = event.wire_name(), "no subscribed webhooks");
            return Ok(0);
        }

        let envelope = EventEnvelope { event, timestamp: now, data };
        let payload = serde_json::to_string(&envelope)
            .map_err(|e| SlotwiseError::Internal(format!("envelope serialization: {e}")))?;

        let mut created = 0;
        for webhook in subscriptions {
            let delivery = WebhookDelivery {
                id: Uuid::new_v4().to_string(),
                webhook_id: webhook.id.clone(),
                event,
                payload: payload.clone(),
                status: DeliveryStatus::Pending,
                response_code: None,
                attempts: 0,
                next_attempt_at: now,
                last_error: None,
                created_at: now,
            };
            self.queue.enqueue(&delivery).await?;
            created += 1;
        }

        debug!(owner_id, event = event.wire_name(), created, "queued webhook deliveries");
        Ok(created)
    }
}
