//! Team and its lineup shape (plain pair or 3-player rotation).

use crate::models::player::{MatchStats, PlayerId};
use crate::models::session::SessionError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a team.
pub type TeamId = Uuid;

/// Who is on a team. Membership never changes after creation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Lineup {
    /// Ordinary doubles team.
    Pair { players: [PlayerId; 2] },
    /// Three players absorbing an odd roster; two of them play each match.
    Rotation {
        players: [PlayerId; 3],
        /// Always in 0..3. Advances by one each time the team finishes a match.
        rotation_index: u8,
        /// The two members slated to play next.
        pair_preference: [PlayerId; 2],
        /// True until the host confirms who plays the next match.
        pending_odd_choice: bool,
    },
}

impl Lineup {
    /// Rotation pair for a given index: `(players[i], players[i + 1 mod 3])`.
    pub fn rotation_pair(players: &[PlayerId; 3], index: u8) -> [PlayerId; 2] {
        let i = usize::from(index % 3);
        [players[i], players[(i + 1) % 3]]
    }

    pub fn members(&self) -> &[PlayerId] {
        match self {
            Lineup::Pair { players } => players.as_slice(),
            Lineup::Rotation { players, .. } => players.as_slice(),
        }
    }

    /// The players expected on court for the next match.
    pub fn next_on_court(&self) -> Vec<PlayerId> {
        match self {
            Lineup::Pair { players } => players.to_vec(),
            Lineup::Rotation {
                pair_preference, ..
            } => pair_preference.to_vec(),
        }
    }
}

/// A team in the session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub lineup: Lineup,
    pub stats: MatchStats,
    /// Set while the team is on court.
    pub is_active: bool,
    /// Retired by a pairing reset. Archived teams are never scheduled.
    #[serde(default)]
    pub archived: bool,
}

impl Team {
    fn with_lineup(lineup: Lineup) -> Self {
        Self {
            id: Uuid::new_v4(),
            lineup,
            stats: MatchStats::default(),
            is_active: false,
            archived: false,
        }
    }

    pub fn pair(a: PlayerId, b: PlayerId) -> Self {
        Self::with_lineup(Lineup::Pair { players: [a, b] })
    }

    /// Three-player team starting with the first two members on court.
    pub fn rotation(a: PlayerId, b: PlayerId, c: PlayerId) -> Self {
        let players = [a, b, c];
        Self::with_lineup(Lineup::Rotation {
            players,
            rotation_index: 0,
            pair_preference: Lineup::rotation_pair(&players, 0),
            pending_odd_choice: true,
        })
    }

    pub fn members(&self) -> &[PlayerId] {
        self.lineup.members()
    }

    pub fn has_member(&self, player_id: PlayerId) -> bool {
        self.members().contains(&player_id)
    }

    pub fn is_rotation(&self) -> bool {
        matches!(self.lineup, Lineup::Rotation { .. })
    }

    pub fn rotation_index(&self) -> Option<u8> {
        match self.lineup {
            Lineup::Pair { .. } => None,
            Lineup::Rotation { rotation_index, .. } => Some(rotation_index),
        }
    }

    /// Host picks which two members of a rotation team play next.
    pub fn choose_pair(&mut self, pair: [PlayerId; 2]) -> Result<(), SessionError> {
        let id = self.id;
        match &mut self.lineup {
            Lineup::Rotation {
                players,
                pair_preference,
                pending_odd_choice,
                ..
            } => {
                if pair[0] == pair[1] || !pair.iter().all(|p| players.contains(p)) {
                    return Err(SessionError::InvalidLineup(id));
                }
                *pair_preference = pair;
                *pending_odd_choice = false;
                Ok(())
            }
            Lineup::Pair { .. } => Err(SessionError::InvalidLineup(id)),
        }
    }

    /// Check a host-reported list of who played: two distinct members of this team.
    pub fn validate_played(&self, played: &[PlayerId]) -> Result<(), SessionError> {
        let distinct = played.len() == 2 && played[0] != played[1];
        if !distinct || !played.iter().all(|p| self.has_member(*p)) {
            return Err(SessionError::InvalidLineup(self.id));
        }
        Ok(())
    }

    /// Apply a finished match: stats, and for rotation teams advance to the next pair.
    pub fn record_finish(&mut self, won: bool) {
        self.stats.record(won);
        self.is_active = false;
        if let Lineup::Rotation {
            players,
            rotation_index,
            pair_preference,
            pending_odd_choice,
        } = &mut self.lineup
        {
            *rotation_index = (*rotation_index + 1) % 3;
            *pair_preference = Lineup::rotation_pair(players, *rotation_index);
            *pending_odd_choice = true;
        }
    }
}
