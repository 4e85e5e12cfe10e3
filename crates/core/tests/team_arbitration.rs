//! Round-robin and collective team scheduling scenarios

mod support;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use slotwise_core::{
    AvailabilityResolver, BookingService, CalendarFallback, ConflictChecker, NotificationService,
    TeamArbitrator,
};
use slotwise_domain::{
    Booking, BookingRequest, BookingStatus, BusyInterval, EventType, Guest, SchedulingKind,
    SlotwiseError,
};
use support::{
    FixedEventTypes, InMemoryBookingStore, InMemoryDeliveryQueue, InMemoryTeamRepository,
    InMemoryWebhookRepository, StaticAvailability, StaticBusyCalendar,
};

// 2025-06-02 is a Monday
fn monday() -> NaiveDate {
    "2025-06-02".parse().unwrap()
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
}

fn guest() -> Guest {
    Guest { name: "Ada".into(), email: "ada@example.com".into(), timezone: "UTC".into() }
}

fn team_event(kind: SchedulingKind) -> EventType {
    EventType {
        id: "et-team".into(),
        owner_id: "team-1".into(),
        title: "Team sync".into(),
        timezone: "UTC".into(),
        duration_min: 30,
        buffer_before_min: 0,
        buffer_after_min: 0,
        min_notice_min: 0,
        max_days_ahead: 30,
        kind,
        requires_confirmation: false,
        active: true,
    }
}

fn seeded_booking(id: &str, host: &str, start: DateTime<Utc>, created_at: DateTime<Utc>) -> Booking {
    Booking {
        id: id.into(),
        event_type_id: "et-team".into(),
        host_id: host.into(),
        guest: guest(),
        start,
        end: start + chrono::Duration::minutes(30),
        status: BookingStatus::Confirmed,
        recurrence_parent_id: None,
        created_at,
    }
}

struct Harness {
    service: BookingService,
    store: Arc<InMemoryBookingStore>,
}

fn harness(kind: SchedulingKind, calendar: StaticBusyCalendar) -> Harness {
    let event_types = vec![team_event(kind)];
    // Availability belongs to the owning team
    let availability = StaticAvailability::new().with_rule("team-1", 0, "09:00:00", "10:00:00");
    let store = Arc::new(InMemoryBookingStore::new(event_types.clone()));
    let conflicts = Arc::new(ConflictChecker::new(
        store.clone(),
        Arc::new(calendar),
        CalendarFallback::FailClosed,
    ));
    let teams = Arc::new(
        InMemoryTeamRepository::new(store.clone())
            .with_member("et-team", "alice", 0)
            .with_member("et-team", "bob", 1)
            .with_member("et-team", "carol", 2),
    );
    let service = BookingService::new(
        Arc::new(FixedEventTypes(event_types)),
        AvailabilityResolver::new(Arc::new(availability)),
        conflicts.clone(),
        TeamArbitrator::new(teams, conflicts),
        store.clone(),
        NotificationService::new(
            Arc::new(InMemoryWebhookRepository::default()),
            Arc::new(InMemoryDeliveryQueue::new()),
        ),
    );
    Harness { service, store }
}

fn request(start: DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        event_type_id: "et-team".into(),
        start,
        guest: guest(),
        recurrence_parent_id: None,
    }
}

#[tokio::test]
async fn round_robin_assigns_the_only_free_member() {
    let h = harness(
        SchedulingKind::RoundRobin,
        StaticBusyCalendar::new()
            .with_busy("alice", BusyInterval::new(at(9, 0), at(10, 0)))
            .with_busy("carol", BusyInterval::new(at(9, 0), at(10, 0))),
    );

    let booking = h.service.create_booking_at(request(at(9, 0)), at(0, 0)).await.unwrap();
    assert_eq!(booking.host_id, "bob");
}

#[tokio::test]
async fn round_robin_picks_least_loaded_member() {
    let h = harness(SchedulingKind::RoundRobin, StaticBusyCalendar::new());
    // Alice carries two recent assignments, bob one, carol one
    h.store.seed(seeded_booking("b-1", "alice", at(11, 0), at(0, 0))).await;
    h.store.seed(seeded_booking("b-2", "alice", at(12, 0), at(0, 0))).await;
    h.store.seed(seeded_booking("b-3", "bob", at(11, 0), at(0, 0))).await;
    h.store.seed(seeded_booking("b-4", "carol", at(11, 0), at(0, 0))).await;

    let booking = h.service.create_booking_at(request(at(9, 0)), at(1, 0)).await.unwrap();
    // bob and carol tie on load; bob joined earlier
    assert_eq!(booking.host_id, "bob");
}

#[tokio::test]
async fn round_robin_load_counts_bookings_by_start_time() {
    let h = harness(SchedulingKind::RoundRobin, StaticBusyCalendar::new());
    // Bob's only assignment started 40 days ago, outside the trailing window;
    // alice and carol each carry one inside it.
    let long_ago = at(11, 0) - chrono::Duration::days(40);
    h.store.seed(seeded_booking("b-old", "bob", long_ago, at(0, 0))).await;
    h.store.seed(seeded_booking("b-a", "alice", at(11, 0), at(0, 0))).await;
    h.store.seed(seeded_booking("b-c", "carol", at(11, 0), at(0, 0))).await;

    let booking = h.service.create_booking_at(request(at(9, 0)), at(1, 0)).await.unwrap();
    assert_eq!(booking.host_id, "bob");
}

#[tokio::test]
async fn round_robin_assignments_rotate_across_bookings() {
    let h = harness(SchedulingKind::RoundRobin, StaticBusyCalendar::new());
    let now = at(0, 0);

    let first = h.service.create_booking_at(request(at(9, 0)), now).await.unwrap();
    let second = h.service.create_booking_at(request(at(9, 30)), now).await.unwrap();
    let third = h.service.create_booking_at(request(at(10, 0)), now).await;

    assert_eq!(first.host_id, "alice");
    assert_eq!(second.host_id, "bob");
    // 10:00 is outside the window; rotation is visible in the first two
    assert!(third.is_err());
}

#[tokio::test]
async fn round_robin_slot_disappears_when_no_member_is_free() {
    let h = harness(
        SchedulingKind::RoundRobin,
        StaticBusyCalendar::new()
            .with_busy("alice", BusyInterval::new(at(9, 0), at(9, 30)))
            .with_busy("bob", BusyInterval::new(at(9, 0), at(9, 30)))
            .with_busy("carol", BusyInterval::new(at(9, 0), at(9, 30))),
    );

    let slots = h.service.list_slots_at("et-team", monday(), at(0, 0)).await.unwrap();
    assert_eq!(slots, vec![at(9, 30)], "9:00 has no assignable member");

    let err = h.service.create_booking_at(request(at(9, 0)), at(0, 0)).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::SlotUnavailable(_)));
}

#[tokio::test]
async fn collective_requires_every_member_free() {
    let free = harness(SchedulingKind::Collective, StaticBusyCalendar::new());
    let slots = free.service.list_slots_at("et-team", monday(), at(0, 0)).await.unwrap();
    assert_eq!(slots, vec![at(9, 0), at(9, 30)]);

    // One busy member removes the slot for the whole team
    let blocked = harness(
        SchedulingKind::Collective,
        StaticBusyCalendar::new().with_busy("carol", BusyInterval::new(at(9, 0), at(9, 30))),
    );
    let slots = blocked.service.list_slots_at("et-team", monday(), at(0, 0)).await.unwrap();
    assert_eq!(slots, vec![at(9, 30)]);

    let err = blocked.service.create_booking_at(request(at(9, 0)), at(0, 0)).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::SlotUnavailable(_)));
}

#[tokio::test]
async fn collective_booking_is_recorded_against_the_organizer() {
    let h = harness(SchedulingKind::Collective, StaticBusyCalendar::new());

    let booking = h.service.create_booking_at(request(at(9, 0)), at(0, 0)).await.unwrap();
    assert_eq!(booking.host_id, "alice", "organizer is the lowest-position member");

    // The committed booking blocks the whole team for that interval
    let slots = h.service.list_slots_at("et-team", monday(), at(0, 0)).await.unwrap();
    assert_eq!(slots, vec![at(9, 30)]);
}

#[tokio::test]
async fn collective_commit_competes_with_every_member() {
    let h = harness(SchedulingKind::Collective, StaticBusyCalendar::new());
    // Bob picks up an individual booking between listing and commit
    h.store.seed(seeded_booking("b-bob", "bob", at(9, 0), at(0, 0))).await;

    let err = h.service.create_booking_at(request(at(9, 0)), at(0, 30)).await.unwrap_err();
    assert!(matches!(err, SlotwiseError::SlotUnavailable(_)));
}
