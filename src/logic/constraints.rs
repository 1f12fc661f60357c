//! Pure predicates over a session snapshot: who is on court, who may play, who already met.

use crate::models::{PairKey, Session, Team, TeamId};
use std::collections::HashSet;

/// Teams on court: the session's record unioned with any team flagged active.
pub fn active_set(session: &Session, teams: &[Team]) -> HashSet<TeamId> {
    let mut active = session.active_teams.clone();
    active.extend(teams.iter().filter(|t| t.is_active).map(|t| t.id));
    active
}

/// A team may be scheduled iff neither source says it is on court.
pub fn is_eligible(session: &Session, team: &Team) -> bool {
    !team.is_active && !session.active_teams.contains(&team.id)
}

/// True if either team is on court, or if it is a team against itself.
pub fn would_conflict(active: &HashSet<TeamId>, a: TeamId, b: TeamId) -> bool {
    a == b || active.contains(&a) || active.contains(&b)
}

pub fn has_met(session: &Session, a: TeamId, b: TeamId) -> bool {
    session.met_history.contains(&PairKey::new(a, b))
}

/// How many other teams `team_id` could legally play right now.
///
/// Zero when the team is unknown or already on court.
pub fn safe_opponent_count(
    session: &Session,
    teams: &[Team],
    team_id: TeamId,
    active: &HashSet<TeamId>,
) -> usize {
    match teams.iter().find(|t| t.id == team_id) {
        Some(team) if !team.is_active => {}
        _ => return 0,
    }
    teams
        .iter()
        .filter(|other| other.id != team_id && !other.is_active)
        .filter(|other| !would_conflict(active, team_id, other.id))
        .filter(|other| !has_met(session, team_id, other.id))
        .count()
}

/// Teams split by running record; input order is kept within each side.
#[derive(Clone, Debug, Default)]
pub struct RecordSplit<'a> {
    /// wins >= losses
    pub winners: Vec<&'a Team>,
    /// wins < losses
    pub losers: Vec<&'a Team>,
}

pub fn partition_by_record<'a, I>(teams: I) -> RecordSplit<'a>
where
    I: IntoIterator<Item = &'a Team>,
{
    let (winners, losers): (Vec<&Team>, Vec<&Team>) =
        teams.into_iter().partition(|t| t.stats.is_winning());
    RecordSplit { winners, losers }
}
