//! Player and the win/loss counters shared with teams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in teams, matches and teammate history).
pub type PlayerId = Uuid;

/// Cumulative match counters. Used for both players and teams.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
}

impl MatchStats {
    pub fn record(&mut self, won: bool) {
        self.played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    /// Wins minus losses.
    pub fn margin(&self) -> i64 {
        i64::from(self.wins) - i64::from(self.losses)
    }

    /// Winners bracket means wins >= losses.
    pub fn is_winning(&self) -> bool {
        self.wins >= self.losses
    }
}

/// A player on the roster.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub stats: MatchStats,
    /// End time of every match this player actually played.
    #[serde(default)]
    pub play_history: Vec<DateTime<Utc>>,
    /// Opaque reference to an avatar image held by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Player {
    /// Create a new player with the given name and zeroed stats.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            stats: MatchStats::default(),
            play_history: Vec::new(),
            avatar: None,
        }
    }

    pub fn record_match(&mut self, won: bool, ended_at: DateTime<Utc>) {
        self.stats.record(won);
        self.play_history.push(ended_at);
    }

    pub fn reset_stats(&mut self) {
        self.stats = MatchStats::default();
        self.play_history.clear();
    }
}
