//! Courts, matches on them, and the finished-match result log.

use crate::models::player::PlayerId;
use crate::models::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Courts are numbered from 1.
pub type CourtId = u32;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// A court. Holds at most one match at a time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: CourtId,
    /// Set iff an in-progress match occupies this court.
    pub current_match_id: Option<MatchId>,
}

impl Court {
    pub fn new(id: CourtId) -> Self {
        Self {
            id,
            current_match_id: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current_match_id.is_none()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
    Canceled,
}

impl MatchStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Canceled)
    }
}

/// A match between two teams on one court.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CourtMatch {
    pub id: MatchId,
    pub court_id: CourtId,
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub status: MatchStatus,
    /// Winners-vs-losers pairing made only to keep the court busy.
    pub is_fallback: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub winner: Option<TeamId>,
    /// Who actually played for each side (matters for 3-player teams).
    pub team_a_played: Option<Vec<PlayerId>>,
    pub team_b_played: Option<Vec<PlayerId>>,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
}

impl CourtMatch {
    /// A match that starts immediately on the given court.
    pub fn start_now(court_id: CourtId, team_a: TeamId, team_b: TeamId, is_fallback: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            court_id,
            team_a,
            team_b,
            status: MatchStatus::InProgress,
            is_fallback,
            created_at: now,
            started_at: Some(now),
            ended_at: None,
            winner: None,
            team_a_played: None,
            team_b_played: None,
            score_a: None,
            score_b: None,
        }
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team_a == team_id || self.team_b == team_id
    }
}

/// Append-only log entry written when a match finishes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: Uuid,
    pub ended_at: DateTime<Utc>,
    pub court_id: CourtId,
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub winner: TeamId,
    pub is_fallback: bool,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub team_a_played: Vec<PlayerId>,
    pub team_b_played: Vec<PlayerId>,
}
