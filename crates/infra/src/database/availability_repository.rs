//! SQLite-backed implementation of the AvailabilityRepository port.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::params;
use slotwise_core::AvailabilityRepository;
use slotwise_domain::{AvailabilityRule, DateOverride, Result};
use tracing::instrument;

use super::{parse_date, parse_time, SqlitePool};
use crate::errors::InfraError;

pub struct SqliteAvailabilityRepository {
    pool: SqlitePool,
}

impl SqliteAvailabilityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a weekly rule. Times are stored as `HH:MM:SS` text.
    pub fn insert_rule(&self, rule: &AvailabilityRule) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO availability_rules (id, owner_id, weekday, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                rule.id,
                rule.owner_id,
                rule.weekday,
                rule.start_time.format("%H:%M:%S").to_string(),
                rule.end_time.format("%H:%M:%S").to_string(),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    /// Upsert the override for `(owner_id, date)`.
    pub fn upsert_override(&self, ov: &DateOverride) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO date_overrides (id, owner_id, date, is_available, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (owner_id, date) DO UPDATE SET
                 is_available = excluded.is_available,
                 start_time = excluded.start_time,
                 end_time = excluded.end_time",
            params![
                ov.id,
                ov.owner_id,
                ov.date.format("%Y-%m-%d").to_string(),
                ov.is_available,
                ov.start_time.map(|t| t.format("%H:%M:%S").to_string()),
                ov.end_time.map(|t| t.format("%H:%M:%S").to_string()),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepository {
    #[instrument(skip(self))]
    async fn rules_for_weekday(&self, owner_id: &str, weekday: u8) -> Result<Vec<AvailabilityRule>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, owner_id, weekday, start_time, end_time
                 FROM availability_rules
                 WHERE owner_id = ?1 AND weekday = ?2
                 ORDER BY start_time",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![owner_id, weekday], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u8>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        rows.into_iter()
            .map(|(id, owner_id, weekday, start, end)| {
                Ok(AvailabilityRule {
                    id,
                    owner_id,
                    weekday,
                    start_time: parse_time(&start)?,
                    end_time: parse_time(&end)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn override_for_date(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DateOverride>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT id, owner_id, date, is_available, start_time, end_time
                 FROM date_overrides
                 WHERE owner_id = ?1 AND date = ?2",
                params![owner_id, date.format("%Y-%m-%d").to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
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
            Some((id, owner_id, date, is_available, start, end)) => Ok(Some(DateOverride {
                id,
                owner_id,
                date: parse_date(&date)?,
                is_available,
                start_time: start.as_deref().map(parse_time).transpose()?,
                end_time: end.as_deref().map(parse_time).transpose()?,
            })),
        }
    }
}
