//! Background delivery worker.
//!
//! Polls the persistent delivery queue for due rows, runs one attempt per
//! row through the transport, and writes the outcome back. Retry scheduling
//! lives here: a failed attempt either reschedules via `next_attempt_at` or
//! terminally fails the delivery. Join handles are tracked, cancellation is
//! explicit, and batch processing runs under a timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use slotwise_core::{DeliveryQueue, WebhookRepository};
use slotwise_domain::constants::{
    MAX_DELIVERY_ATTEMPTS, MAX_DELIVERY_ERROR_LEN, RETRY_BACKOFF_SECS,
};
use slotwise_domain::{Result, SlotwiseError, WebhookDelivery};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::sender::{AttemptOutcome, DeliveryTransport};

/// Configuration for the delivery worker.
#[derive(Debug, Clone)]
pub struct DeliveryWorkerConfig {
    /// Maximum number of deliveries to process per batch
    pub batch_size: usize,
    /// Interval between polling attempts
    pub poll_interval: Duration,
    /// Timeout for processing a single batch
    pub processing_timeout: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for DeliveryWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            poll_interval: Duration::from_secs(10),
            processing_timeout: Duration::from_secs(120),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Delivery worker with explicit lifecycle management.
pub struct DeliveryWorker {
    queue: Arc<dyn DeliveryQueue>,
    webhooks: Arc<dyn WebhookRepository>,
    transport: Arc<dyn DeliveryTransport>,
    config: DeliveryWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl DeliveryWorker {
    pub fn new(
        queue: Arc<dyn DeliveryQueue>,
        webhooks: Arc<dyn WebhookRepository>,
        transport: Arc<dyn DeliveryTransport>,
        config: DeliveryWorkerConfig,
    ) -> Self {
        Self {
            queue,
            webhooks,
            transport,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the worker, spawning the background processing task.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(SlotwiseError::Internal("delivery worker already running".into()));
        }

        info!("starting delivery worker");
        self.cancellation = CancellationToken::new();

        let queue = Arc::clone(&self.queue);
        let webhooks = Arc::clone(&self.webhooks);
        let transport = Arc::clone(&self.transport);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(queue, webhooks, transport, config, cancel).await;
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Stop the worker and wait for the processing task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(SlotwiseError::Internal("delivery worker not running".into()));
        }

        info!("stopping delivery worker");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "delivery worker task panicked");
                    return Err(SlotwiseError::Internal("delivery worker task panicked".into()));
                }
                Err(_) => {
                    warn!("delivery worker did not stop within join timeout");
                    return Err(SlotwiseError::Internal("delivery worker join timeout".into()));
                }
            }
        }

        info!("delivery worker stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn process_loop(
        queue: Arc<dyn DeliveryQueue>,
        webhooks: Arc<dyn WebhookRepository>,
        transport: Arc<dyn DeliveryTransport>,
        config: DeliveryWorkerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("delivery worker loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.poll_interval) => {
                    let batch = Self::process_batch(
                        &queue,
                        &webhooks,
                        &transport,
                        config.batch_size,
                    );
                    match tokio::time::timeout(config.processing_timeout, batch).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => error!(error = %e, "delivery batch failed"),
                        Err(_) => warn!(
                            timeout_secs = config.processing_timeout.as_secs(),
                            "delivery batch timed out"
                        ),
                    }
                }
            }
        }
    }

    /// Process one batch of due deliveries.
    pub async fn process_batch(
        queue: &Arc<dyn DeliveryQueue>,
        webhooks: &Arc<dyn WebhookRepository>,
        transport: &Arc<dyn DeliveryTransport>,
        batch_size: usize,
    ) -> Result<()> {
        let now = Utc::now();
        let due = queue.due_batch(now, batch_size).await?;
        if due.is_empty() {
            return Ok(());
        }

        debug!(count = due.len(), "processing due deliveries");

        for delivery in due {
            let webhook = match webhooks.find_webhook(&delivery.webhook_id).await? {
                Some(webhook) if webhook.active => webhook,
                _ => {
                    // Subscription removed or disabled after enqueue.
                    queue
                        .mark_attempt_failed(
                            &delivery.id,
                            "webhook missing or inactive",
                            None,
                            None,
                        )
                        .await?;
                    continue;
                }
            };

            match transport.attempt(&webhook, &delivery, Utc::now()).await {
                AttemptOutcome::Delivered(code) => {
                    debug!(delivery_id = %delivery.id, code, "delivery succeeded");
                    queue.mark_success(&delivery.id, code).await?;
                }
                AttemptOutcome::Failed { reason, response_code, retryable } => {
                    let next = Self::next_attempt(&delivery, retryable);
                    if next.is_none() {
                        warn!(
                            delivery_id = %delivery.id,
                            reason = %reason,
                            "delivery terminally failed"
                        );
                    }
                    queue
                        .mark_attempt_failed(
                            &delivery.id,
                            &truncate_reason(&reason),
                            response_code,
                            next,
                        )
                        .await?;
                }
            }
        }

        Ok(())
    }

    /// Backoff schedule for a just-failed attempt. `None` means terminal:
    /// either the failure is not retryable or no attempts remain.
    fn next_attempt(
        delivery: &WebhookDelivery,
        retryable: bool,
    ) -> Option<chrono::DateTime<Utc>> {
        let attempt_no = delivery.attempts + 1;
        if !retryable || attempt_no >= MAX_DELIVERY_ATTEMPTS {
            return None;
        }
        let backoff = RETRY_BACKOFF_SECS[(attempt_no - 1) as usize];
        Some(Utc::now() + chrono::Duration::seconds(backoff))
    }
}

fn truncate_reason(reason: &str) -> String {
    if reason.len() <= MAX_DELIVERY_ERROR_LEN {
        return reason.to_string();
    }
    let mut truncated = reason
        .chars()
        .take(MAX_DELIVERY_ERROR_LEN.saturating_sub(3))
        .collect::<String>();
    truncated.push_str("...");
    truncated
}

impl Drop for DeliveryWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("delivery worker dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};
    use slotwise_domain::{DeliveryStatus, Webhook, WebhookEvent};
    use tokio::sync::Mutex as TokioMutex;

    use super::*;

    struct FixedWebhooks(Vec<Webhook>);

    #[async_trait]
    impl WebhookRepository for FixedWebhooks {
        async fn active_subscriptions(
            &self,
            owner_id: &str,
            event: WebhookEvent,
        ) -> Result<Vec<Webhook>> {
            Ok(self
                .0
                .iter()
                .filter(|w| w.owner_id == owner_id && w.active && w.subscribes_to(event))
                .cloned()
                .collect())
        }

        async fn find_webhook(&self, id: &str) -> Result<Option<Webhook>> {
            Ok(self.0.iter().find(|w| w.id == id).cloned())
        }
    }

    #[derive(Default)]
    struct InMemoryQueue {
        rows: TokioMutex<Vec<WebhookDelivery>>,
    }

    #[async_trait]
    impl DeliveryQueue for InMemoryQueue {
        async fn enqueue(&self, delivery: &WebhookDelivery) -> Result<()> {
            self.rows.lock().await.push(delivery.clone());
            Ok(())
        }

        async fn due_batch(
            &self,
            now: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<WebhookDelivery>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|d| d.status == DeliveryStatus::Pending && d.next_attempt_at <= now)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn mark_success(&self, id: &str, response_code: u16) -> Result<()> {
            let mut rows = self.rows.lock().await;
            if let Some(row) = rows.iter_mut().find(|d| d.id == id) {
                row.status = DeliveryStatus::Success;
                row.response_code = Some(response_code);
                row.attempts += 1;
                row.last_error = None;
            }
            Ok(())
        }

        async fn mark_attempt_failed(
            &self,
            id: &str,
            error: &str,
            response_code: Option<u16>,
            next_attempt_at: Option<DateTime<Utc>>,
        ) -> Result<()> {
            let mut rows = self.rows.lock().await;
            if let Some(row) = rows.iter_mut().find(|d| d.id == id) {
                row.attempts += 1;
                row.response_code = response_code;
                row.last_error = Some(error.to_string());
                match next_attempt_at {
                    Some(next) => row.next_attempt_at = next,
                    None => row.status = DeliveryStatus::Failed,
                }
            }
            Ok(())
        }

        async fn deliveries_for_webhook(
            &self,
            webhook_id: &str,
        ) -> Result<Vec<WebhookDelivery>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|d| d.webhook_id == webhook_id)
                .cloned()
                .collect())
        }
    }

    /// Transport returning scripted outcomes in order.
    struct ScriptedTransport {
        outcomes: TokioMutex<Vec<AttemptOutcome>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<AttemptOutcome>) -> Self {
            Self { outcomes: TokioMutex::new(outcomes) }
        }
    }

    #[async_trait]
    impl DeliveryTransport for ScriptedTransport {
        async fn attempt(
            &self,
            _webhook: &Webhook,
            _delivery: &WebhookDelivery,
            _now: DateTime<Utc>,
        ) -> AttemptOutcome {
            self.outcomes.lock().await.remove(0)
        }
    }

    fn active_webhook() -> Webhook {
        Webhook {
            id: "wh-1".to_string(),
            owner_id: "owner-1".to_string(),
            url: "https://hooks.example.com/receive".to_string(),
            events: vec![WebhookEvent::BookingCreated],
            secret: "whsec_test".to_string(),
            active: true,
        }
    }

    fn pending_delivery(attempts: u32) -> WebhookDelivery {
        let past = Utc::now() - ChronoDuration::seconds(1);
        WebhookDelivery {
            id: "d-1".to_string(),
            webhook_id: "wh-1".to_string(),
            event: WebhookEvent::BookingCreated,
            payload: r#"{"event":"booking.created"}"#.to_string(),
            status: DeliveryStatus::Pending,
            response_code: None,
            attempts,
            next_attempt_at: past,
            last_error: None,
            created_at: past,
        }
    }

    async fn run_batch(
        queue: &Arc<InMemoryQueue>,
        webhooks: Vec<Webhook>,
        transport: ScriptedTransport,
    ) {
        let queue_port: Arc<dyn DeliveryQueue> = queue.clone();
        let webhooks: Arc<dyn WebhookRepository> = Arc::new(FixedWebhooks(webhooks));
        let transport: Arc<dyn DeliveryTransport> = Arc::new(transport);
        DeliveryWorker::process_batch(&queue_port, &webhooks, &transport, 50).await.unwrap();
    }

    #[tokio::test]
    async fn successful_attempt_marks_success() {
        let queue = Arc::new(InMemoryQueue::default());
        queue.enqueue(&pending_delivery(0)).await.unwrap();

        run_batch(
            &queue,
            vec![active_webhook()],
            ScriptedTransport::new(vec![AttemptOutcome::Delivered(200)]),
        )
        .await;

        let rows = queue.rows.lock().await;
        assert_eq!(rows[0].status, DeliveryStatus::Success);
        assert_eq!(rows[0].response_code, Some(200));
        assert_eq!(rows[0].attempts, 1);
    }

    #[tokio::test]
    async fn first_failure_reschedules_one_minute_out() {
        let queue = Arc::new(InMemoryQueue::default());
        queue.enqueue(&pending_delivery(0)).await.unwrap();

        let before = Utc::now();
        run_batch(
            &queue,
            vec![active_webhook()],
            ScriptedTransport::new(vec![AttemptOutcome::Failed {
                reason: "subscriber returned 500".to_string(),
                response_code: Some(500),
                retryable: true,
            }]),
        )
        .await;

        let rows = queue.rows.lock().await;
        assert_eq!(rows[0].status, DeliveryStatus::Pending);
        assert_eq!(rows[0].attempts, 1);
        assert_eq!(rows[0].response_code, Some(500));
        let delay = rows[0].next_attempt_at - before;
        assert!(delay >= ChronoDuration::seconds(59) && delay <= ChronoDuration::seconds(61));
    }

    #[tokio::test]
    async fn second_failure_reschedules_five_minutes_out() {
        let queue = Arc::new(InMemoryQueue::default());
        queue.enqueue(&pending_delivery(1)).await.unwrap();

        let before = Utc::now();
        run_batch(
            &queue,
            vec![active_webhook()],
            ScriptedTransport::new(vec![AttemptOutcome::Failed {
                reason: "connection refused".to_string(),
                response_code: None,
                retryable: true,
            }]),
        )
        .await;

        let rows = queue.rows.lock().await;
        assert_eq!(rows[0].status, DeliveryStatus::Pending);
        assert_eq!(rows[0].attempts, 2);
        let delay = rows[0].next_attempt_at - before;
        assert!(delay >= ChronoDuration::seconds(299) && delay <= ChronoDuration::seconds(301));
    }

    #[tokio::test]
    async fn third_failure_is_terminal() {
        let queue = Arc::new(InMemoryQueue::default());
        queue.enqueue(&pending_delivery(2)).await.unwrap();

        run_batch(
            &queue,
            vec![active_webhook()],
            ScriptedTransport::new(vec![AttemptOutcome::Failed {
                reason: "subscriber returned 500".to_string(),
                response_code: Some(500),
                retryable: true,
            }]),
        )
        .await;

        let rows = queue.rows.lock().await;
        assert_eq!(rows[0].status, DeliveryStatus::Failed);
        assert_eq!(rows[0].attempts, 3);
    }

    #[tokio::test]
    async fn non_retryable_failure_is_terminal_on_first_attempt() {
        let queue = Arc::new(InMemoryQueue::default());
        queue.enqueue(&pending_delivery(0)).await.unwrap();

        run_batch(
            &queue,
            vec![active_webhook()],
            ScriptedTransport::new(vec![AttemptOutcome::Failed {
                reason: "webhook target resolves to blocked address 10.0.0.5".to_string(),
                response_code: None,
                retryable: false,
            }]),
        )
        .await;

        let rows = queue.rows.lock().await;
        assert_eq!(rows[0].status, DeliveryStatus::Failed);
        assert_eq!(rows[0].attempts, 1);
    }

    #[tokio::test]
    async fn missing_or_inactive_webhook_fails_terminally() {
        let queue = Arc::new(InMemoryQueue::default());
        queue.enqueue(&pending_delivery(0)).await.unwrap();

        let mut inactive = active_webhook();
        inactive.active = false;
        run_batch(&queue, vec![inactive], ScriptedTransport::new(vec![])).await;

        let rows = queue.rows.lock().await;
        assert_eq!(rows[0].status, DeliveryStatus::Failed);
        assert_eq!(rows[0].last_error.as_deref(), Some("webhook missing or inactive"));
    }

    #[tokio::test]
    async fn not_yet_due_deliveries_are_left_alone() {
        let queue = Arc::new(InMemoryQueue::default());
        let mut future = pending_delivery(0);
        future.next_attempt_at = Utc::now() + ChronoDuration::seconds(120);
        queue.enqueue(&future).await.unwrap();

        run_batch(&queue, vec![active_webhook()], ScriptedTransport::new(vec![])).await;

        let rows = queue.rows.lock().await;
        assert_eq!(rows[0].status, DeliveryStatus::Pending);
        assert_eq!(rows[0].attempts, 0);
    }

    #[test]
    fn long_reasons_are_truncated() {
        let long = "x".repeat(1000);
        let truncated = truncate_reason(&long);
        assert_eq!(truncated.len(), MAX_DELIVERY_ERROR_LEN);
        assert!(truncated.ends_with("..."));
    }
}
