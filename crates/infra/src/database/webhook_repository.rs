//! SQLite-backed implementation of the WebhookRepository port.
//!
//! The `events` column holds the subscription list as a JSON array of wire
//! names, e.g. `["booking.created"]`.

use async_trait::async_trait;
use rusqlite::params;
use slotwise_core::WebhookRepository;
use slotwise_domain::{Result, SlotwiseError, Webhook, WebhookEvent};
use tracing::instrument;

use super::SqlitePool;
use crate::errors::InfraError;

pub struct SqliteWebhookRepository {
    pool: SqlitePool,
}

impl SqliteWebhookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn insert(&self, webhook: &Webhook) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO webhooks (id, owner_id, url, events, secret, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                webhook.id,
                webhook.owner_id,
                webhook.url,
                encode_events(&webhook.events)?,
                webhook.secret,
                webhook.active,
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

fn encode_events(events: &[WebhookEvent]) -> Result<String> {
    serde_json::to_string(events)
        .map_err(|e| SlotwiseError::Internal(format!("failed to encode event list: {e}")))
}

fn decode_events(text: &str) -> Result<Vec<WebhookEvent>> {
    serde_json::from_str(text)
        .map_err(|e| SlotwiseError::Database(format!("malformed event list '{text}': {e}")))
}

type WebhookRow = (String, String, String, String, String, bool);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WebhookRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn into_webhook(row: WebhookRow) -> Result<Webhook> {
    let (id, owner_id, url, events, secret, active) = row;
    Ok(Webhook { id, owner_id, url, events: decode_events(&events)?, secret, active })
}

#[async_trait]
impl WebhookRepository for SqliteWebhookRepository {
    #[instrument(skip(self))]
    async fn active_subscriptions(
        &self,
        owner_id: &str,
        event: WebhookEvent,
    ) -> Result<Vec<Webhook>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, owner_id, url, events, secret, active
                 FROM webhooks
                 WHERE owner_id = ?1 AND active = 1
                 ORDER BY id",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![owner_id], read_row)
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        // Subscription filtering happens here rather than in SQL so the
        // event list stays an opaque JSON column.
        let mut webhooks = Vec::new();
        for row in rows {
            let webhook = into_webhook(row)?;
            if webhook.subscribes_to(event) {
                webhooks.push(webhook);
            }
        }
        Ok(webhooks)
    }

    #[instrument(skip(self))]
    async fn find_webhook(&self, id: &str) -> Result<Option<Webhook>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT id, owner_id, url, events, secret, active
                 FROM webhooks
                 WHERE id = ?1",
                params![id],
                read_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(InfraError::from(other)),
            })?;
        row.map(into_webhook).transpose()
    }
}
