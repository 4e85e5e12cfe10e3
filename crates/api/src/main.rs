//! Slotwise server binary.
//!
//! Wires configuration, the SQLite pool, repositories, core services, the
//! webhook delivery worker, and the axum router, then serves until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use slotwise_api::{router, AppState};
use slotwise_core::{
    AvailabilityRepository, AvailabilityResolver, BookingReadRepository, BookingService,
    BookingStore, BusyCalendarPort, CalendarFallback, ConflictChecker, DeliveryQueue,
    EventTypeRepository, NotificationService, TeamArbitrator, TeamRepository, WebhookRepository,
};
use slotwise_domain::{Result, SlotwiseError};
use slotwise_infra::calendar::{HttpBusyCalendar, NullBusyCalendar};
use slotwise_infra::config;
use slotwise_infra::database::{
    SqliteAvailabilityRepository, SqliteBookingRepository, SqliteDeliveryQueue,
    SqliteEventTypeRepository, SqlitePool, SqliteTeamRepository, SqliteWebhookRepository,
};
use slotwise_infra::webhooks::{
    DeliveryWorker, DeliveryWorkerConfig, SystemResolver, TargetGuard, WebhookSender,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::load()?;
    let pool = SqlitePool::open(&config.database.path, config.database.pool_size)?;
    info!(path = %config.database.path, "database ready");

    let availability: Arc<dyn AvailabilityRepository> =
        Arc::new(SqliteAvailabilityRepository::new(pool.clone()));
    let event_types: Arc<dyn EventTypeRepository> =
        Arc::new(SqliteEventTypeRepository::new(pool.clone()));
    let teams: Arc<dyn TeamRepository> = Arc::new(SqliteTeamRepository::new(pool.clone()));
    let webhooks: Arc<dyn WebhookRepository> =
        Arc::new(SqliteWebhookRepository::new(pool.clone()));
    let queue: Arc<dyn DeliveryQueue> = Arc::new(SqliteDeliveryQueue::new(pool.clone()));

    let bookings = Arc::new(SqliteBookingRepository::new(pool));
    let booking_reads: Arc<dyn BookingReadRepository> = bookings.clone();
    let booking_store: Arc<dyn BookingStore> = bookings;

    let calendar: Arc<dyn BusyCalendarPort> = match &config.calendar.base_url {
        Some(base_url) => Arc::new(HttpBusyCalendar::new(
            base_url,
            Duration::from_secs(config.calendar.timeout_seconds),
        )?),
        None => Arc::new(NullBusyCalendar),
    };

    let conflicts = Arc::new(ConflictChecker::new(
        booking_reads,
        calendar,
        CalendarFallback::FailClosed,
    ));
    let service = Arc::new(BookingService::new(
        event_types,
        AvailabilityResolver::new(availability),
        conflicts.clone(),
        TeamArbitrator::new(teams, conflicts),
        booking_store,
        NotificationService::new(webhooks.clone(), queue.clone()),
    ));

    let sender = WebhookSender::new(TargetGuard::new(Arc::new(SystemResolver)))?;
    let mut worker = DeliveryWorker::new(
        queue,
        webhooks,
        Arc::new(sender),
        DeliveryWorkerConfig {
            batch_size: config.webhooks.batch_size,
            poll_interval: Duration::from_secs(config.webhooks.poll_interval_seconds),
            ..DeliveryWorkerConfig::default()
        },
    );
    worker.start()?;

    let app = router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .map_err(|e| {
            SlotwiseError::Network(format!("failed to bind {}: {e}", config.server.bind_addr))
        })?;
    info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SlotwiseError::Internal(format!("server error: {e}")))?;

    worker.stop().await?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
