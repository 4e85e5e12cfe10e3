//! SQLite-backed implementation of the TeamRepository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use slotwise_core::TeamRepository;
use slotwise_domain::{Result, TeamMember};
use tracing::instrument;

use super::SqlitePool;
use crate::errors::InfraError;

pub struct SqliteTeamRepository {
    pool: SqlitePool,
}

impl SqliteTeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn insert_member(&self, member: &TeamMember) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO team_members (team_id, user_id, position) VALUES (?1, ?2, ?3)",
            params![member.team_id, member.user_id, member.position],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    #[instrument(skip(self))]
    async fn members_for_event(&self, event_type_id: &str) -> Result<Vec<TeamMember>> {
        let conn = self.pool.get()?;
        // Team event types store their team id in owner_id.
        let mut stmt = conn
            .prepare(
                "SELECT m.team_id, m.user_id, m.position
                 FROM team_members m
                 JOIN event_types et ON et.owner_id = m.team_id
                 WHERE et.id = ?1
                 ORDER BY m.position",
            )
            .map_err(InfraError::from)?;

        let members = stmt
            .query_map(params![event_type_id], |row| {
                Ok(TeamMember {
                    team_id: row.get(0)?,
                    user_id: row.get(1)?,
                    position: row.get(2)?,
                })
            })
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;
        Ok(members)
    }

    #[instrument(skip(self))]
    async fn assignment_count_since(
        &self,
        event_type_id: &str,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*)
                 FROM bookings
                 WHERE event_type_id = ?1
                   AND host_id = ?2
                   AND status != 'CANCELLED'
                   AND start_ts >= ?3",
                params![event_type_id, user_id, since.timestamp()],
                |row| row.get(0),
            )
            .map_err(InfraError::from)?;
        Ok(count)
    }
}
