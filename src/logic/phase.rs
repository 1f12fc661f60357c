//! Phase controller: coverage moves to bracket once every team has played. No way back.

use crate::models::{Phase, Team};

/// Phase to be in given the current teams.
///
/// An empty roster stays in coverage; "every team has played" is not taken as
/// vacuously true, so a session cannot reach bracket before any team exists.
pub fn next_phase(current: Phase, teams: &[Team]) -> Phase {
    match current {
        Phase::Coverage if !teams.is_empty() && teams.iter().all(|t| t.stats.played >= 1) => {
            Phase::Bracket
        }
        _ => current,
    }
}
