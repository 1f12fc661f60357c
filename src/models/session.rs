//! Session (tournament state), its configuration, and the full per-session record.

use crate::models::court::{Court, CourtId, CourtMatch, MatchId, ResultRow};
use crate::models::player::{Player, PlayerId};
use crate::models::team::{Team, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during session operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),
    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),
    #[error("Team {0} not found")]
    TeamNotFound(TeamId),
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    #[error("Court {0} not found")]
    CourtNotFound(CourtId),
    /// Fewer than 4 players on the roster at start.
    #[error("Need at least 4 players to start doubles matches (have {have})")]
    NotEnoughPlayers { have: usize },
    #[error("Roster is locked once play has started")]
    RosterLocked,
    #[error("Session has already started")]
    AlreadyStarted,
    #[error("Session has not started yet")]
    NotStarted,
    #[error("A player named {0:?} already exists")]
    DuplicatePlayerName(String),
    #[error("Player name must not be empty")]
    EmptyPlayerName,
    #[error("Player {0} still belongs to a team")]
    PlayerInTeam(PlayerId),
    #[error("Court {0} already has a match in progress")]
    CourtOccupied(CourtId),
    #[error("Team {winner} did not play in match {match_id}")]
    WinnerNotInMatch { match_id: MatchId, winner: TeamId },
    #[error("Invalid lineup for team {0}")]
    InvalidLineup(TeamId),
    #[error("Invalid session config: {0}")]
    InvalidConfig(&'static str),
    #[error("Session store lock poisoned")]
    LockPoisoned,
}

/// Unique identifier for a session.
pub type SessionId = Uuid;

/// Tournament stage. Moves one way: coverage, then bracket.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Every team gets at least one match before records matter.
    #[default]
    Coverage,
    /// Pair teams by running record.
    Bracket,
}

/// What to do with the odd player out.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddMode {
    /// Last three players form one rotating 3-player team.
    #[default]
    ThreePlayerRotation,
    /// Leave the odd player out of team formation.
    None,
}

/// Most courts one session may run.
pub const MAX_COURTS: u32 = 12;

fn default_court_count() -> u32 {
    2
}

fn default_target_score() -> u32 {
    21
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_court_count")]
    pub court_count: u32,
    #[serde(default)]
    pub odd_mode: OddMode,
    /// Points to win a game. Shown to clients; the engine does not score.
    #[serde(default = "default_target_score")]
    pub target_score: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            court_count: default_court_count(),
            odd_mode: OddMode::default(),
            target_score: default_target_score(),
        }
    }
}

/// Unordered pair of ids stored as `(min, max)`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct PairKey(Uuid, Uuid);

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Scheduling state of one session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    pub config: SessionConfig,
    /// Teams currently on court. Never overlaps `queue_teams`.
    pub active_teams: HashSet<TeamId>,
    /// Teams waiting for a court.
    pub queue_teams: HashSet<TeamId>,
    /// Player pairs that have ever been teammates. Only grows during a session.
    pub teammate_history: HashSet<PairKey>,
    /// Team pairs that have already played each other. Only grows during a session.
    pub met_history: HashSet<PairKey>,
    pub started_at: Option<DateTime<Utc>>,
    /// Freezes roster edits once play has started.
    pub locked: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            phase: Phase::Coverage,
            config,
            active_teams: HashSet::new(),
            queue_teams: HashSet::new(),
            teammate_history: HashSet::new(),
            met_history: HashSet::new(),
            started_at: None,
            locked: false,
        }
    }

    /// Move teams from the queue onto court.
    pub fn activate(&mut self, ids: &[TeamId]) {
        for id in ids {
            self.queue_teams.remove(id);
            self.active_teams.insert(*id);
        }
    }

    /// Move teams off court back into the queue.
    pub fn release(&mut self, ids: &[TeamId]) {
        for id in ids {
            self.active_teams.remove(id);
            self.queue_teams.insert(*id);
        }
    }
}

/// Everything stored for one session: the unit the store snapshots and transacts on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session: Session,
    pub players: Vec<Player>,
    /// Includes archived teams from earlier pairings.
    pub teams: Vec<Team>,
    pub courts: Vec<Court>,
    pub matches: Vec<CourtMatch>,
    pub results: Vec<ResultRow>,
}

impl SessionRecord {
    /// New session with `config.court_count` idle courts and an empty roster.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        if config.court_count == 0 {
            return Err(SessionError::InvalidConfig("court_count must be at least 1"));
        }
        if config.court_count > MAX_COURTS {
            return Err(SessionError::InvalidConfig("court_count must be at most 12"));
        }
        Ok(Self {
            session: Session::new(config),
            players: Vec::new(),
            teams: Vec::new(),
            courts: (1..=config.court_count).map(Court::new).collect(),
            matches: Vec::new(),
            results: Vec::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.session.id
    }

    /// Teams of the current pairing (not archived).
    pub fn live_teams(&self) -> Vec<Team> {
        self.teams.iter().filter(|t| !t.archived).cloned().collect()
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, SessionError> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(SessionError::PlayerNotFound(id))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, SessionError> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SessionError::PlayerNotFound(id))
    }

    pub fn team(&self, id: TeamId) -> Result<&Team, SessionError> {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .ok_or(SessionError::TeamNotFound(id))
    }

    pub fn team_mut(&mut self, id: TeamId) -> Result<&mut Team, SessionError> {
        self.teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(SessionError::TeamNotFound(id))
    }

    pub fn court(&self, id: CourtId) -> Result<&Court, SessionError> {
        self.courts
            .iter()
            .find(|c| c.id == id)
            .ok_or(SessionError::CourtNotFound(id))
    }

    pub fn court_mut(&mut self, id: CourtId) -> Result<&mut Court, SessionError> {
        self.courts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SessionError::CourtNotFound(id))
    }

    pub fn match_by_id(&self, id: MatchId) -> Result<&CourtMatch, SessionError> {
        self.matches
            .iter()
            .find(|m| m.id == id)
            .ok_or(SessionError::MatchNotFound(id))
    }

    pub fn match_mut(&mut self, id: MatchId) -> Result<&mut CourtMatch, SessionError> {
        self.matches
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(SessionError::MatchNotFound(id))
    }

    pub fn clear_courts(&mut self) {
        for c in &mut self.courts {
            c.current_match_id = None;
        }
    }
}
