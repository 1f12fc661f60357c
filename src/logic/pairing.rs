//! Team building: split a roster into teams, and rebuild teams while avoiding past teammates.

use crate::models::{OddMode, PairKey, Player, PlayerId, SessionConfig, Team};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Minimum roster size for doubles play.
pub const MIN_PLAYERS: usize = 4;

/// Non-fatal notes produced while building teams.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PairingWarning {
    /// Fewer than four players; no teams were built.
    NotEnoughPlayers { have: usize },
    /// An odd roster was absorbed by one 3-player team.
    RotationTeamCreated,
    /// These two players had to be teammates again.
    TeammateRepeat { first: PlayerId, second: PlayerId },
}

impl fmt::Display for PairingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingWarning::NotEnoughPlayers { have } => {
                write!(f, "Need at least {} players to start doubles matches (have {})", MIN_PLAYERS, have)
            }
            PairingWarning::RotationTeamCreated => write!(
                f,
                "Odd player count: created one 3-player team (rotation required when they play)"
            ),
            PairingWarning::TeammateRepeat { .. } => {
                write!(f, "Some teammate-repeat violations were unavoidable")
            }
        }
    }
}

/// Teams plus any warnings from building them.
#[derive(Clone, Debug, Default)]
pub struct TeamBuild {
    pub teams: Vec<Team>,
    pub warnings: Vec<PairingWarning>,
}

/// Build the opening teams with a thread-local RNG. See [`build_initial_teams_with_rng`].
pub fn build_initial_teams(config: &SessionConfig, players: &[Player]) -> TeamBuild {
    build_initial_teams_with_rng(config, players, &mut rand::thread_rng())
}

/// Shuffle the roster and cut it into consecutive pairs.
///
/// An odd roster either yields one 3-player rotation team from the last three
/// shuffled players (`OddMode::ThreePlayerRotation`) or drops the last player.
pub fn build_initial_teams_with_rng<R: Rng + ?Sized>(
    config: &SessionConfig,
    players: &[Player],
    rng: &mut R,
) -> TeamBuild {
    let mut build = TeamBuild::default();
    if players.len() < MIN_PLAYERS {
        build.warnings.push(PairingWarning::NotEnoughPlayers {
            have: players.len(),
        });
        return build;
    }

    let mut pool: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    pool.shuffle(rng);

    let rotation = pool.len() % 2 == 1 && config.odd_mode == OddMode::ThreePlayerRotation;
    let paired_len = if rotation { pool.len() - 3 } else { pool.len() };

    build.teams = pool[..paired_len]
        .chunks_exact(2)
        .map(|chunk| Team::pair(chunk[0], chunk[1]))
        .collect();

    if rotation {
        let last = &pool[paired_len..];
        build.teams.push(Team::rotation(last[0], last[1], last[2]));
        build.warnings.push(PairingWarning::RotationTeamCreated);
    }
    build
}

/// Every unordered pair of players that shares a team.
pub fn teammate_history_from_teams(teams: &[Team]) -> HashSet<PairKey> {
    let mut history = HashSet::new();
    for team in teams {
        let ids = team.members();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                history.insert(PairKey::new(*a, *b));
            }
        }
    }
    history
}

/// Rebuild teams with a thread-local RNG. See [`rebuild_teams_avoiding_teammates_with_rng`].
pub fn rebuild_teams_avoiding_teammates(
    players: &[Player],
    prior_teammates: &HashSet<PairKey>,
) -> TeamBuild {
    rebuild_teams_avoiding_teammates_with_rng(players, prior_teammates, &mut rand::thread_rng())
}

/// Greedy best-effort repair pairing.
///
/// Shuffles, then takes players in pool order and gives each the first remaining
/// partner they have not teamed with before. When every candidate is a repeat the
/// pairing still goes ahead and a warning is recorded. Only 2-player teams are
/// produced; an odd player out is left unpaired.
pub fn rebuild_teams_avoiding_teammates_with_rng<R: Rng + ?Sized>(
    players: &[Player],
    prior_teammates: &HashSet<PairKey>,
    rng: &mut R,
) -> TeamBuild {
    let mut shuffled: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    shuffled.shuffle(rng);
    let mut pool: VecDeque<PlayerId> = shuffled.into();

    let penalty = |a: PlayerId, b: PlayerId| -> u32 {
        u32::from(prior_teammates.contains(&PairKey::new(a, b)))
    };

    let mut build = TeamBuild::default();
    while let Some(first) = pool.pop_front() {
        let best = pool
            .iter()
            .enumerate()
            .map(|(idx, candidate)| (penalty(first, *candidate), idx))
            .min();
        let Some((score, idx)) = best else {
            break;
        };
        let Some(second) = pool.remove(idx) else {
            break;
        };
        if score > 0 {
            log::warn!("Re-pairing former teammates {} and {}", first, second);
            build
                .warnings
                .push(PairingWarning::TeammateRepeat { first, second });
        }
        build.teams.push(Team::pair(first, second));
    }
    build
}
