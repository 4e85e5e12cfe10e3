//! Team arbitration logic

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use slotwise_domain::constants::ROUND_ROBIN_WINDOW_DAYS;
use slotwise_domain::{BusyInterval, EventType, Result, SchedulingKind, SlotwiseError};
use tracing::debug;

use crate::conflict::ConflictChecker;
use super::ports::TeamRepository;

/// Selects which team member(s) fulfill a booking request.
///
/// Round-robin picks one conflict-free member with the fewest assignments in
/// a trailing window, tie-broken by stable member ordering (join position).
/// Collective requires every member simultaneously free and designates the
/// lowest-position member as organizer.
pub struct TeamArbitrator {
    teams: Arc<dyn TeamRepository>,
    conflicts: Arc<ConflictChecker>,
}

impl TeamArbitrator {
    pub fn new(teams: Arc<dyn TeamRepository>, conflicts: Arc<ConflictChecker>) -> Self {
        Self { teams, conflicts }
    }

    /// Pick the round-robin assignee for a candidate interval, or `None`
    /// when no member is conflict-free.
    pub async fn select_round_robin(
        &self,
        event_type: &EventType,
        candidate: BusyInterval,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let members = self.roster(event_type).await?;
        let since = now - Duration::days(ROUND_ROBIN_WINDOW_DAYS);

        let mut best: Option<(i64, i64, String)> = None;
        for member in &members {
            if !self.conflicts.is_free(&member.user_id, candidate).await? {
                continue;
            }
            let load = self
                .teams
                .assignment_count_since(&event_type.id, &member.user_id, since)
                .await?;
            let key = (load, member.position, member.user_id.clone());
            if best.as_ref().map_or(true, |current| (key.0, key.1) < (current.0, current.1)) {
                best = Some(key);
            }
        }

        let selected = best.map(|(_, _, user_id)| user_id);
        debug!(event_type = %event_type.id, ?selected, "round-robin selection");
        Ok(selected)
    }

    /// Check collective availability; returns the organizer id when every
    /// member is free, `None` when any member has a conflict.
    pub async fn check_collective(
        &self,
        event_type: &EventType,
        candidate: BusyInterval,
    ) -> Result<Option<String>> {
        let members = self.roster(event_type).await?;
        for member in &members {
            if !self.conflicts.is_free(&member.user_id, candidate).await? {
                return Ok(None);
            }
        }
        Ok(members.first().map(|organizer| organizer.user_id.clone()))
    }

    /// Slot-listing gate: is the candidate assignable under the event type's
    /// scheduling mode? Uses the same per-member checks as commit time.
    pub async fn is_assignable(
        &self,
        event_type: &EventType,
        candidate: BusyInterval,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        match event_type.kind {
            SchedulingKind::Individual => self.conflicts.is_free(&event_type.owner_id, candidate).await,
            SchedulingKind::RoundRobin => {
                Ok(self.select_round_robin(event_type, candidate, now).await?.is_some())
            }
            SchedulingKind::Collective => {
                Ok(self.check_collective(event_type, candidate).await?.is_some())
            }
        }
    }

    /// Every member a collective booking competes with at commit time.
    pub async fn member_ids(&self, event_type: &EventType) -> Result<Vec<String>> {
        Ok(self.roster(event_type).await?.into_iter().map(|m| m.user_id).collect())
    }

    async fn roster(&self, event_type: &EventType) -> Result<Vec<slotwise_domain::TeamMember>> {
        let mut members = self.teams.members_for_event(&event_type.id).await?;
        if members.is_empty() {
            return Err(SlotwiseError::NotFound(format!(
                "event type {} has no team members",
                event_type.id
            )));
        }
        members.sort_by_key(|m| m.position);
        Ok(members)
    }
}
