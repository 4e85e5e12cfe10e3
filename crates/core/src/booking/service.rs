//! Booking service - slot listing and the commit-time write path

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::json;
use slotwise_domain::{
    Booking, BookingRequest, BookingStatus, BusyInterval, EventType, Result, SchedulingKind,
    SlotwiseError, WebhookEvent,
};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::availability::AvailabilityResolver;
use crate::conflict::ConflictChecker;
use crate::notify::NotificationService;
use crate::slots::{candidate_interval, generate_slots, local_to_utc, SlotQuery};
use crate::team::TeamArbitrator;
use super::ports::{BookingStore, EventTypeRepository};

/// Orchestrates the read path (slot listing) and the write path (commit,
/// cancel) of the booking engine.
///
/// The write path re-runs availability, conflict, and arbitration checks
/// against current state before handing the insert to the transactional
/// store, because time has elapsed since the guest saw the slot list.
pub struct BookingService {
    event_types: Arc<dyn EventTypeRepository>,
    resolver: AvailabilityResolver,
    conflicts: Arc<ConflictChecker>,
    arbitrator: TeamArbitrator,
    store: Arc<dyn BookingStore>,
    notifications: NotificationService,
}

impl BookingService {
    pub fn new(
        event_types: Arc<dyn EventTypeRepository>,
        resolver: AvailabilityResolver,
        conflicts: Arc<ConflictChecker>,
        arbitrator: TeamArbitrator,
        store: Arc<dyn BookingStore>,
        notifications: NotificationService,
    ) -> Self {
        Self { event_types, resolver, conflicts, arbitrator, store, notifications }
    }

    /// List the bookable start times of an event type on a date.
    ///
    /// An empty list is a valid result and distinct from `NotFound` (unknown
    /// or inactive event type).
    #[instrument(skip(self))]
    pub async fn list_slots(
        &self,
        event_type_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>> {
        self.list_slots_at(event_type_id, date, Utc::now()).await
    }

    /// `list_slots` with an explicit "now", shared with commit-time
    /// re-validation so both paths agree on the same inputs.
    pub async fn list_slots_at(
        &self,
        event_type_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let event_type = self.load_active_event_type(event_type_id).await?;
        let tz = parse_timezone(&event_type.timezone)?;
        let windows = self.resolver.resolve(&event_type.owner_id, date).await?;
        if windows.is_empty() {
            return Ok(Vec::new());
        }

        match event_type.kind {
            SchedulingKind::Individual => {
                let (range_start, range_end) = day_range(date, tz);
                let occupied = self
                    .conflicts
                    .occupied_for(&event_type.owner_id, range_start, range_end)
                    .await?;
                Ok(generate_slots(&SlotQuery {
                    windows: &windows,
                    date,
                    timezone: tz,
                    event_type: &event_type,
                    now,
                    occupied: &occupied,
                }))
            }
            SchedulingKind::RoundRobin | SchedulingKind::Collective => {
                // Candidates are generated unconstrained, then gated on team
                // eligibility with the same per-member checks used at commit.
                let candidates = generate_slots(&SlotQuery {
                    windows: &windows,
                    date,
                    timezone: tz,
                    event_type: &event_type,
                    now,
                    occupied: &[],
                });
                let mut slots = Vec::with_capacity(candidates.len());
                for start in candidates {
                    let interval = candidate_interval(&event_type, start);
                    if self.arbitrator.is_assignable(&event_type, interval, now).await? {
                        slots.push(start);
                    }
                }
                Ok(slots)
            }
        }
    }

    /// Commit a booking.
    ///
    /// Re-validates the requested start against current availability, picks
    /// the host through arbitration, and inserts under the store's exclusion
    /// guarantee. Failure of the re-validation is `SlotUnavailable`; a
    /// different slot is never substituted. The booking commits even when
    /// notification enqueueing fails.
    #[instrument(skip(self, request), fields(event_type_id = %request.event_type_id))]
    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking> {
        self.create_booking_at(request, Utc::now()).await
    }

    /// `create_booking` with an explicit "now" for deterministic tests.
    pub async fn create_booking_at(
        &self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let event_type = self.load_active_event_type(&request.event_type_id).await?;
        let tz = parse_timezone(&event_type.timezone)?;
        if request.guest.timezone.parse::<Tz>().is_err() {
            return Err(SlotwiseError::InvalidInput(format!(
                "unknown guest timezone: {}",
                request.guest.timezone
            )));
        }

        // Re-validation: the requested start must still be produced by the
        // same deterministic slot generation the guest saw.
        let local_date = request.start.with_timezone(&tz).date_naive();
        let slots = self.list_slots_at(&event_type.id, local_date, now).await?;
        if !slots.contains(&request.start) {
            return Err(SlotwiseError::SlotUnavailable(
                "this time is no longer available, please pick another".into(),
            ));
        }

        let interval = candidate_interval(&event_type, request.start);
        let (host_id, competing_hosts) = self.arbitrate(&event_type, interval, now).await?;

        let status = if event_type.requires_confirmation {
            BookingStatus::Pending
        } else {
            BookingStatus::Confirmed
        };
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            event_type_id: event_type.id.clone(),
            host_id,
            guest: request.guest,
            start: request.start,
            end: request.start + chrono::Duration::minutes(event_type.duration_min),
            status,
            recurrence_parent_id: request.recurrence_parent_id,
            created_at: now,
        };

        self.store.insert_if_free(&booking, interval, &competing_hosts).await?;
        debug!(booking_id = %booking.id, host_id = %booking.host_id, "booking committed");

        self.emit(&event_type.owner_id, WebhookEvent::BookingCreated, &booking, None, now).await;
        Ok(booking)
    }

    /// Cancel a single booking. Rejects unknown ids with `NotFound` and
    /// repeated cancels with `AlreadyCancelled`.
    #[instrument(skip(self))]
    pub async fn cancel_booking(&self, booking_id: &str, reason: Option<String>) -> Result<Booking> {
        let booking = self.store.cancel(booking_id).await?;
        let owner_id = self.owner_for(&booking.event_type_id).await;
        if let Some(owner_id) = owner_id {
            self.emit(&owner_id, WebhookEvent::BookingCancelled, &booking, reason, Utc::now())
                .await;
        }
        Ok(booking)
    }

    /// Cancel every occurrence of a recurring series. Emits one
    /// `booking.cancelled` event per occurrence.
    #[instrument(skip(self))]
    pub async fn cancel_series(&self, parent_id: &str, reason: Option<String>) -> Result<Vec<Booking>> {
        let cancelled = self.store.cancel_series(parent_id).await?;
        let now = Utc::now();
        for booking in &cancelled {
            if let Some(owner_id) = self.owner_for(&booking.event_type_id).await {
                self.emit(
                    &owner_id,
                    WebhookEvent::BookingCancelled,
                    booking,
                    reason.clone(),
                    now,
                )
                .await;
            }
        }
        Ok(cancelled)
    }

    /// Fetch a booking with its derived status.
    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking> {
        let mut booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound(format!("booking {booking_id}")))?;
        booking.status = booking.effective_status(Utc::now());
        Ok(booking)
    }

    async fn arbitrate(
        &self,
        event_type: &EventType,
        interval: BusyInterval,
        now: DateTime<Utc>,
    ) -> Result<(String, Vec<String>)> {
        match event_type.kind {
            SchedulingKind::Individual => {
                Ok((event_type.owner_id.clone(), vec![event_type.owner_id.clone()]))
            }
            SchedulingKind::RoundRobin => {
                let host = self
                    .arbitrator
                    .select_round_robin(event_type, interval, now)
                    .await?
                    .ok_or_else(|| {
                        SlotwiseError::SlotUnavailable("no team member is available".into())
                    })?;
                Ok((host.clone(), vec![host]))
            }
            SchedulingKind::Collective => {
                let organizer = self
                    .arbitrator
                    .check_collective(event_type, interval)
                    .await?
                    .ok_or_else(|| {
                        SlotwiseError::SlotUnavailable("a team member is no longer free".into())
                    })?;
                let members = self.arbitrator.member_ids(event_type).await?;
                Ok((organizer, members))
            }
        }
    }

    /// Notification dispatch is a side channel: enqueue failures are logged
    /// and recorded nowhere else, never rolled back into the booking result.
    async fn emit(
        &self,
        owner_id: &str,
        event: WebhookEvent,
        booking: &Booking,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        let mut data = match serde_json::to_value(booking) {
            Ok(value) => value,
            Err(err) => {
                error!(booking_id = %booking.id, error = %err, "failed to serialize booking event");
                return;
            }
        };
        if let Some(reason) = reason {
            data["cancellation_reason"] = json!(reason);
        }
        if let Err(err) = self.notifications.booking_event(owner_id, event, data, now).await {
            error!(booking_id = %booking.id, error = %err, "failed to enqueue webhook deliveries");
        }
    }

    async fn owner_for(&self, event_type_id: &str) -> Option<String> {
        match self.event_types.find_event_type(event_type_id).await {
            Ok(Some(event_type)) => Some(event_type.owner_id),
            Ok(None) => {
                error!(event_type_id, "event type missing while emitting booking event");
                None
            }
            Err(err) => {
                error!(event_type_id, error = %err, "event type lookup failed while emitting");
                None
            }
        }
    }

    async fn load_active_event_type(&self, id: &str) -> Result<EventType> {
        let event_type = self
            .event_types
            .find_event_type(id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound(format!("event type {id}")))?;
        if !event_type.active {
            return Err(SlotwiseError::NotFound(format!("event type {id} is inactive")));
        }
        Ok(event_type)
    }
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SlotwiseError::InvalidInput(format!("unknown timezone: {name}")))
}

/// UTC range covering the local date, widened by a day on each side so
/// buffers and timezone offsets never clip an occupied interval.
fn day_range(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = chrono::NaiveTime::MIN;
    let start = local_to_utc(date - chrono::Duration::days(1), midnight, tz)
        .unwrap_or_else(|| date.and_time(midnight).and_utc() - chrono::Duration::days(2));
    let end = local_to_utc(date + chrono::Duration::days(2), midnight, tz)
        .unwrap_or_else(|| date.and_time(midnight).and_utc() + chrono::Duration::days(3));
    (start, end)
}
