//! SQLite-backed implementation of the DeliveryQueue port.
//!
//! Delivery rows are append-and-mutate: created at trigger time, updated as
//! attempts complete, never deleted. `next_attempt_at` is what makes the
//! retry schedule restart-safe.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use slotwise_core::DeliveryQueue;
use slotwise_domain::{
    DeliveryStatus, Result, SlotwiseError, WebhookDelivery, WebhookEvent,
};
use tracing::instrument;

use super::{from_epoch, SqlitePool};
use crate::errors::InfraError;

pub struct SqliteDeliveryQueue {
    pool: SqlitePool,
}

impl SqliteDeliveryQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_to_str(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Pending => "PENDING",
        DeliveryStatus::Success => "SUCCESS",
        DeliveryStatus::Failed => "FAILED",
    }
}

fn status_from_str(text: &str) -> Result<DeliveryStatus> {
    match text {
        "PENDING" => Ok(DeliveryStatus::Pending),
        "SUCCESS" => Ok(DeliveryStatus::Success),
        "FAILED" => Ok(DeliveryStatus::Failed),
        other => Err(SlotwiseError::Database(format!("unknown delivery status '{other}'"))),
    }
}

type DeliveryRow = (
    String,
    String,
    String,
    String,
    String,
    Option<u16>,
    u32,
    i64,
    Option<String>,
    i64,
);

const DELIVERY_COLUMNS: &str = "id, webhook_id, event, payload, status, response_code, \
     attempts, next_attempt_at, last_error, created_at";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeliveryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn into_delivery(row: DeliveryRow) -> Result<WebhookDelivery> {
    let (
        id,
        webhook_id,
        event,
        payload,
        status,
        response_code,
        attempts,
        next_attempt_at,
        last_error,
        created_at,
    ) = row;
    let event = WebhookEvent::parse(&event)
        .ok_or_else(|| SlotwiseError::Database(format!("unknown webhook event '{event}'")))?;
    Ok(WebhookDelivery {
        id,
        webhook_id,
        event,
        payload,
        status: status_from_str(&status)?,
        response_code,
        attempts,
        next_attempt_at: from_epoch(next_attempt_at)?,
        last_error,
        created_at: from_epoch(created_at)?,
    })
}

#[async_trait]
impl DeliveryQueue for SqliteDeliveryQueue {
    #[instrument(skip(self, delivery), fields(delivery_id = %delivery.id))]
    async fn enqueue(&self, delivery: &WebhookDelivery) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO webhook_deliveries (
                id, webhook_id, event, payload, status, response_code,
                attempts, next_attempt_at, last_error, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                delivery.id,
                delivery.webhook_id,
                delivery.event.wire_name(),
                delivery.payload,
                status_to_str(delivery.status),
                delivery.response_code,
                delivery.attempts,
                delivery.next_attempt_at.timestamp(),
                delivery.last_error,
                delivery.created_at.timestamp(),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn due_batch(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<WebhookDelivery>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {DELIVERY_COLUMNS} FROM webhook_deliveries
                 WHERE status = 'PENDING' AND next_attempt_at <= ?1
                 ORDER BY next_attempt_at
                 LIMIT ?2"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![now.timestamp(), limit as i64], read_row)
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        rows.into_iter().map(into_delivery).collect()
    }

    #[instrument(skip(self))]
    async fn mark_success(&self, id: &str, response_code: u16) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE webhook_deliveries
             SET status = 'SUCCESS',
                 response_code = ?2,
                 attempts = attempts + 1,
                 last_error = NULL
             WHERE id = ?1",
            params![id, response_code],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self, error))]
    async fn mark_attempt_failed(
        &self,
        id: &str,
        error: &str,
        response_code: Option<u16>,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let conn = self.pool.get()?;
        match next_attempt_at {
            Some(next) => {
                conn.execute(
                    "UPDATE webhook_deliveries
                     SET attempts = attempts + 1,
                         response_code = ?2,
                         last_error = ?3,
                         next_attempt_at = ?4
                     WHERE id = ?1",
                    params![id, response_code, error, next.timestamp()],
                )
                .map_err(InfraError::from)?;
            }
            None => {
                conn.execute(
                    "UPDATE webhook_deliveries
                     SET status = 'FAILED',
                         attempts = attempts + 1,
                         response_code = ?2,
                         last_error = ?3
                     WHERE id = ?1",
                    params![id, response_code, error],
                )
                .map_err(InfraError::from)?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn deliveries_for_webhook(&self, webhook_id: &str) -> Result<Vec<WebhookDelivery>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {DELIVERY_COLUMNS} FROM webhook_deliveries
                 WHERE webhook_id = ?1
                 ORDER BY created_at"
            ))
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![webhook_id], read_row)
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        rows.into_iter().map(into_delivery).collect()
    }
}
