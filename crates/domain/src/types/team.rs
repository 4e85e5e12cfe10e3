//! Team membership

use serde::{Deserialize, Serialize};

/// Membership of a user in a team.
///
/// `position` is the stable join order and the deterministic tie-break for
/// round-robin selection and collective organizer designation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: String,
    pub user_id: String,
    pub position: i64,
}
