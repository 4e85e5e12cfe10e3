//! SQLite-backed implementation of the EventTypeRepository port.

use async_trait::async_trait;
use rusqlite::params;
use slotwise_core::EventTypeRepository;
use slotwise_domain::{EventType, Result, SchedulingKind, SlotwiseError};
use tracing::instrument;

use super::SqlitePool;
use crate::errors::InfraError;

pub struct SqliteEventTypeRepository {
    pool: SqlitePool,
}

impl SqliteEventTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn insert(&self, event_type: &EventType) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO event_types (
                id, owner_id, title, timezone, duration_min,
                buffer_before_min, buffer_after_min, min_notice_min,
                max_days_ahead, kind, requires_confirmation, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                event_type.id,
                event_type.owner_id,
                event_type.title,
                event_type.timezone,
                event_type.duration_min,
                event_type.buffer_before_min,
                event_type.buffer_after_min,
                event_type.min_notice_min,
                event_type.max_days_ahead,
                kind_to_str(event_type.kind),
                event_type.requires_confirmation,
                event_type.active,
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

fn kind_to_str(kind: SchedulingKind) -> &'static str {
    match kind {
        SchedulingKind::Individual => "INDIVIDUAL",
        SchedulingKind::RoundRobin => "ROUND_ROBIN",
        SchedulingKind::Collective => "COLLECTIVE",
    }
}

fn kind_from_str(text: &str) -> Result<SchedulingKind> {
    match text {
        "INDIVIDUAL" => Ok(SchedulingKind::Individual),
        "ROUND_ROBIN" => Ok(SchedulingKind::RoundRobin),
        "COLLECTIVE" => Ok(SchedulingKind::Collective),
        other => Err(SlotwiseError::Database(format!("unknown scheduling kind '{other}'"))),
    }
}

#[async_trait]
impl EventTypeRepository for SqliteEventTypeRepository {
    #[instrument(skip(self))]
    async fn find_event_type(&self, id: &str) -> Result<Option<EventType>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT id, owner_id, title, timezone, duration_min,
                        buffer_before_min, buffer_after_min, min_notice_min,
                        max_days_ahead, kind, requires_confirmation, active
                 FROM event_types
                 WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, i64>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, bool>(10)?,
                        row.get::<_, bool>(11)?,
                    ))
                },
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(InfraError::from(other)),
            })?;

        match row {
            None => Ok(None),
            Some((
                id,
                owner_id,
                title,
                timezone,
                duration_min,
                buffer_before_min,
                buffer_after_min,
                min_notice_min,
                max_days_ahead,
                kind,
                requires_confirmation,
                active,
            )) => Ok(Some(EventType {
                id,
                owner_id,
                title,
                timezone,
                duration_min,
                buffer_before_min,
                buffer_after_min,
                min_notice_min,
                max_days_ahead,
                kind: kind_from_str(&kind)?,
                requires_confirmation,
                active,
            })),
        }
    }
}
