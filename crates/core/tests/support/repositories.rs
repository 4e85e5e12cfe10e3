//! In-memory mock repositories for core integration tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use slotwise_core::{
    AvailabilityRepository, BookingReadRepository, BookingStore, DeliveryQueue,
    EventTypeRepository, TeamRepository, WebhookRepository,
};
use slotwise_domain::{
    AvailabilityRule, Booking, BookingStatus, BusyInterval, DateOverride, EventType, Result,
    SlotwiseError, TeamMember, Webhook, WebhookDelivery, WebhookEvent,
};
use tokio::sync::Mutex as TokioMutex;

/// In-memory availability rules and overrides.
#[derive(Default)]
pub struct StaticAvailability {
    rules: Vec<AvailabilityRule>,
    overrides: Vec<DateOverride>,
}

impl StaticAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, owner_id: &str, weekday: u8, start: &str, end: &str) -> Self {
        self.rules.push(AvailabilityRule {
            id: format!("rule-{}", self.rules.len()),
            owner_id: owner_id.to_string(),
            weekday,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        });
        self
    }

    pub fn with_override(mut self, ovr: DateOverride) -> Self {
        self.overrides.push(ovr);
        self
    }
}

#[async_trait]
impl AvailabilityRepository for StaticAvailability {
    async fn rules_for_weekday(&self, owner_id: &str, weekday: u8) -> Result<Vec<AvailabilityRule>> {
        Ok(self
            .rules
            .iter()
            .filter(|r| r.owner_id == owner_id && r.weekday == weekday)
            .cloned()
            .collect())
    }

    async fn override_for_date(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DateOverride>> {
        Ok(self.overrides.iter().find(|o| o.owner_id == owner_id && o.date == date).cloned())
    }
}

/// Fixed event-type catalogue.
pub struct FixedEventTypes(pub Vec<EventType>);

#[async_trait]
impl EventTypeRepository for FixedEventTypes {
    async fn find_event_type(&self, id: &str) -> Result<Option<EventType>> {
        Ok(self.0.iter().find(|et| et.id == id).cloned())
    }
}

/// In-memory booking store doubling as the conflict-check read side.
///
/// `insert_if_free` serializes on a single mutex, mirroring the storage-level
/// exclusion the SQLite adapter provides with an immediate transaction.
pub struct InMemoryBookingStore {
    event_types: Vec<EventType>,
    bookings: TokioMutex<Vec<Booking>>,
}

impl InMemoryBookingStore {
    pub fn new(event_types: Vec<EventType>) -> Self {
        Self { event_types, bookings: TokioMutex::new(Vec::new()) }
    }

    pub async fn all_bookings(&self) -> Vec<Booking> {
        self.bookings.lock().await.clone()
    }

    pub async fn seed(&self, booking: Booking) {
        self.bookings.lock().await.push(booking);
    }

    fn inflate(&self, booking: &Booking) -> BusyInterval {
        let (before, after) = self
            .event_types
            .iter()
            .find(|et| et.id == booking.event_type_id)
            .map(|et| (et.buffer_before_min, et.buffer_after_min))
            .unwrap_or((0, 0));
        BusyInterval::new(booking.start, booking.end).inflated(before, after)
    }

    fn is_active(booking: &Booking) -> bool {
        matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[async_trait]
impl BookingReadRepository for InMemoryBookingStore {
    async fn active_intervals(
        &self,
        host_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let range = BusyInterval::new(range_start, range_end);
        Ok(self
            .bookings
            .lock()
            .await
            .iter()
            .filter(|b| b.host_id == host_id && Self::is_active(b))
            .map(|b| self.inflate(b))
            .filter(|interval| interval.overlaps(&range))
            .collect())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_if_free(
        &self,
        booking: &Booking,
        inflated: BusyInterval,
        competing_hosts: &[String],
    ) -> Result<()> {
        let mut bookings = self.bookings.lock().await;
        let clash = bookings
            .iter()
            .filter(|b| competing_hosts.contains(&b.host_id) && Self::is_active(b))
            .any(|b| self.inflate(b).overlaps(&inflated));
        if clash {
            return Err(SlotwiseError::SlotUnavailable(
                "interval overlaps an existing booking".into(),
            ));
        }
        bookings.push(booking.clone());
        Ok(())
    }

    async fn find_booking(&self, id: &str) -> Result<Option<Booking>> {
        Ok(self.bookings.lock().await.iter().find(|b| b.id == id).cloned())
    }

    async fn cancel(&self, id: &str) -> Result<Booking> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| SlotwiseError::NotFound(format!("booking {id}")))?;
        if booking.status == BookingStatus::Cancelled {
            return Err(SlotwiseError::AlreadyCancelled(format!("booking {id}")));
        }
        booking.status = BookingStatus::Cancelled;
        Ok(booking.clone())
    }

    async fn cancel_series(&self, parent_id: &str) -> Result<Vec<Booking>> {
        let mut bookings = self.bookings.lock().await;
        let mut cancelled = Vec::new();
        for booking in bookings.iter_mut() {
            if booking.recurrence_parent_id.as_deref() == Some(parent_id)
                && booking.status != BookingStatus::Cancelled
            {
                booking.status = BookingStatus::Cancelled;
                cancelled.push(booking.clone());
            }
        }
        if cancelled.is_empty() {
            return Err(SlotwiseError::NotFound(format!("series {parent_id}")));
        }
        Ok(cancelled)
    }
}

/// Team roster with assignment counts backed by the shared booking store.
pub struct InMemoryTeamRepository {
    members: HashMap<String, Vec<TeamMember>>,
    store: Arc<InMemoryBookingStore>,
}

impl InMemoryTeamRepository {
    pub fn new(store: Arc<InMemoryBookingStore>) -> Self {
        Self { members: HashMap::new(), store }
    }

    pub fn with_member(mut self, event_type_id: &str, user_id: &str, position: i64) -> Self {
        self.members.entry(event_type_id.to_string()).or_default().push(TeamMember {
            team_id: format!("team-{event_type_id}"),
            user_id: user_id.to_string(),
            position,
        });
        self
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn members_for_event(&self, event_type_id: &str) -> Result<Vec<TeamMember>> {
        Ok(self.members.get(event_type_id).cloned().unwrap_or_default())
    }

    async fn assignment_count_since(
        &self,
        event_type_id: &str,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(self
            .store
            .all_bookings()
            .await
            .iter()
            .filter(|b| {
                b.event_type_id == event_type_id
                    && b.host_id == user_id
                    && b.status != BookingStatus::Cancelled
                    && b.start >= since
            })
            .count() as i64)
    }
}

/// Fixed webhook subscriptions.
#[derive(Default)]
pub struct InMemoryWebhookRepository {
    webhooks: Vec<Webhook>,
}

impl InMemoryWebhookRepository {
    pub fn new(webhooks: Vec<Webhook>) -> Self {
        Self { webhooks }
    }
}

#[async_trait]
impl WebhookRepository for InMemoryWebhookRepository {
    async fn active_subscriptions(
        &self,
        owner_id: &str,
        event: WebhookEvent,
    ) -> Result<Vec<Webhook>> {
        Ok(self
            .webhooks
            .iter()
            .filter(|w| w.owner_id == owner_id && w.active && w.subscribes_to(event))
            .cloned()
            .collect())
    }

    async fn find_webhook(&self, id: &str) -> Result<Option<Webhook>> {
        Ok(self.webhooks.iter().find(|w| w.id == id).cloned())
    }
}

/// Recording delivery queue with due-batch semantics.
#[derive(Default)]
pub struct InMemoryDeliveryQueue {
    deliveries: TokioMutex<Vec<WebhookDelivery>>,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<WebhookDelivery> {
        self.deliveries.lock().await.clone()
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn enqueue(&self, delivery: &WebhookDelivery) -> Result<()> {
        self.deliveries.lock().await.push(delivery.clone());
        Ok(())
    }

    async fn due_batch(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<WebhookDelivery>> {
        Ok(self
            .deliveries
            .lock()
            .await
            .iter()
            .filter(|d| {
                d.status == slotwise_domain::DeliveryStatus::Pending && d.next_attempt_at <= now
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_success(&self, id: &str, response_code: u16) -> Result<()> {
        let mut deliveries = self.deliveries.lock().await;
        let delivery = deliveries
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| SlotwiseError::NotFound(format!("delivery {id}")))?;
        delivery.status = slotwise_domain::DeliveryStatus::Success;
        delivery.response_code = Some(response_code);
        delivery.attempts += 1;
        Ok(())
    }

    async fn mark_attempt_failed(
        &self,
        id: &str,
        error: &str,
        response_code: Option<u16>,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut deliveries = self.deliveries.lock().await;
        let delivery = deliveries
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| SlotwiseError::NotFound(format!("delivery {id}")))?;
        delivery.attempts += 1;
        delivery.last_error = Some(error.to_string());
        delivery.response_code = response_code;
        match next_attempt_at {
            Some(at) => delivery.next_attempt_at = at,
            None => delivery.status = slotwise_domain::DeliveryStatus::Failed,
        }
        Ok(())
    }

    async fn deliveries_for_webhook(&self, webhook_id: &str) -> Result<Vec<WebhookDelivery>> {
        Ok(self
            .deliveries
            .lock()
            .await
            .iter()
            .filter(|d| d.webhook_id == webhook_id)
            .cloned()
            .collect())
    }
}
