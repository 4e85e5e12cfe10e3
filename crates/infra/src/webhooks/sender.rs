//! Single delivery attempt: guard, sign, POST.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use slotwise_domain::constants::{
    DELIVERY_TIMEOUT_SECS, EVENT_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use slotwise_domain::{Result, Webhook, WebhookDelivery};
use tracing::{debug, instrument};

use super::guard::TargetGuard;
use super::signature::sign_payload;
use crate::http::HttpClient;

/// Result of one delivery attempt. `retryable` distinguishes transient
/// transport/server failures from terminal ones like a blocked target.
#[derive(Debug)]
pub enum AttemptOutcome {
    Delivered(u16),
    Failed { reason: String, response_code: Option<u16>, retryable: bool },
}

/// Transport seam between the worker and the network, mockable in tests.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn attempt(
        &self,
        webhook: &Webhook,
        delivery: &WebhookDelivery,
        now: DateTime<Utc>,
    ) -> AttemptOutcome;
}

/// Production transport: signs the snapshotted payload and POSTs it.
pub struct WebhookSender {
    http: HttpClient,
    guard: TargetGuard,
}

impl WebhookSender {
    pub fn new(guard: TargetGuard) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(Duration::from_secs(DELIVERY_TIMEOUT_SECS))?,
            guard,
        })
    }
}

#[async_trait]
impl DeliveryTransport for WebhookSender {
    #[instrument(skip(self, webhook, delivery), fields(delivery_id = %delivery.id, webhook_id = %webhook.id))]
    async fn attempt(
        &self,
        webhook: &Webhook,
        delivery: &WebhookDelivery,
        now: DateTime<Utc>,
    ) -> AttemptOutcome {
        // Re-checked on every attempt; the target may resolve differently
        // between retries. Guard rejections never retry.
        if let Err(e) = self.guard.check(&webhook.url) {
            return AttemptOutcome::Failed {
                reason: e.to_string(),
                response_code: None,
                retryable: false,
            };
        }

        let signature = match sign_payload(&webhook.secret, delivery.payload.as_bytes()) {
            Ok(signature) => signature,
            Err(e) => {
                return AttemptOutcome::Failed {
                    reason: e.to_string(),
                    response_code: None,
                    retryable: false,
                }
            }
        };

        let request = self
            .http
            .request(Method::POST, &webhook.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, now.timestamp().to_string())
            .header(EVENT_HEADER, delivery.event.wire_name())
            .body(delivery.payload.clone());

        match self.http.send(request).await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    debug!(%status, "webhook delivered");
                    AttemptOutcome::Delivered(status.as_u16())
                } else {
                    AttemptOutcome::Failed {
                        reason: format!("subscriber returned {status}"),
                        response_code: Some(status.as_u16()),
                        retryable: true,
                    }
                }
            }
            Err(e) => AttemptOutcome::Failed {
                reason: e.to_string(),
                response_code: None,
                retryable: true,
            },
        }
    }
}
