//! Next-match proposal for an idle court.
//!
//! Pure: reads a snapshot and never mutates it. `None` means no legal pairing
//! exists right now and the court should stay idle.

use crate::logic::constraints::{
    active_set, has_met, partition_by_record, safe_opponent_count, would_conflict,
};
use crate::models::{Phase, Session, Team, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// A pairing suggested for a court.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProposedMatch {
    pub team_a: TeamId,
    pub team_b: TeamId,
    /// Winner vs loser pairing, only used when no same-tier pairing exists.
    pub is_fallback: bool,
}

impl ProposedMatch {
    fn new(team_a: TeamId, team_b: TeamId, is_fallback: bool) -> Self {
        Self {
            team_a,
            team_b,
            is_fallback,
        }
    }
}

/// Pick the next match according to the session phase.
///
/// `teams` should be the live (non-archived) teams of the session.
pub fn propose_next_match(session: &Session, teams: &[Team]) -> Option<ProposedMatch> {
    let proposal = match session.phase {
        Phase::Coverage => pick_coverage(session, teams),
        Phase::Bracket => pick_bracket(session, teams),
    };
    match &proposal {
        Some(p) => log::debug!(
            "Proposed {} vs {} ({:?}, fallback={})",
            p.team_a,
            p.team_b,
            session.phase,
            p.is_fallback
        ),
        None => log::debug!("No legal pairing ({:?})", session.phase),
    }
    proposal
}

/// Shared state for one proposal: the active set and each team's option count.
struct Snapshot<'a> {
    session: &'a Session,
    active: HashSet<TeamId>,
    options: HashMap<TeamId, usize>,
    eligible: Vec<&'a Team>,
}

impl<'a> Snapshot<'a> {
    fn new(session: &'a Session, teams: &'a [Team]) -> Self {
        let active = active_set(session, teams);
        let eligible: Vec<&Team> = teams
            .iter()
            .filter(|t| !t.is_active && !active.contains(&t.id))
            .collect();
        let options = eligible
            .iter()
            .map(|t| (t.id, safe_opponent_count(session, teams, t.id, &active)))
            .collect();
        Self {
            session,
            active,
            options,
            eligible,
        }
    }

    fn options(&self, team: &Team) -> usize {
        self.options.get(&team.id).copied().unwrap_or(0)
    }

    fn is_legal(&self, a: &Team, b: &Team) -> bool {
        !would_conflict(&self.active, a.id, b.id) && !has_met(self.session, a.id, b.id)
    }

    /// Scarcest options first, then best record.
    fn rank_by_record(&self, mut group: Vec<&'a Team>) -> Vec<&'a Team> {
        group.sort_by_key(|t| (self.options(t), Reverse(t.stats.margin())));
        group
    }

    /// First legal pair scanning `ranked` as A then `ranked` as B.
    fn first_legal_pair(&self, ranked: &[&Team]) -> Option<(TeamId, TeamId)> {
        ranked.iter().find_map(|a| {
            ranked
                .iter()
                .find(|b| self.is_legal(a, b))
                .map(|b| (a.id, b.id))
        })
    }
}

/// Coverage: unplayed teams first, then scarcest options, then fewest played.
fn pick_coverage(session: &Session, teams: &[Team]) -> Option<ProposedMatch> {
    let snap = Snapshot::new(session, teams);
    if snap.eligible.len() < 2 {
        return None;
    }

    let mut ranked = snap.eligible.clone();
    ranked.sort_by_key(|t| (t.stats.played > 0, snap.options(t), t.stats.played));

    snap.first_legal_pair(&ranked)
        .map(|(a, b)| ProposedMatch::new(a, b, false))
}

/// Bracket: winners vs winners, then losers vs losers, then winner vs loser as fallback.
///
/// Every scan, the fallback included, walks each side in ranked order (scarcest
/// options, then best margin), not in roster order.
fn pick_bracket(session: &Session, teams: &[Team]) -> Option<ProposedMatch> {
    let snap = Snapshot::new(session, teams);
    if snap.eligible.len() < 2 {
        return None;
    }

    let split = partition_by_record(snap.eligible.iter().copied());
    let winners = snap.rank_by_record(split.winners);
    let losers = snap.rank_by_record(split.losers);

    if let Some((a, b)) = snap.first_legal_pair(&winners) {
        return Some(ProposedMatch::new(a, b, false));
    }
    if let Some((a, b)) = snap.first_legal_pair(&losers) {
        return Some(ProposedMatch::new(a, b, false));
    }

    winners.iter().find_map(|a| {
        losers
            .iter()
            .find(|b| snap.is_legal(a, b))
            .map(|b| ProposedMatch::new(a.id, b.id, true))
    })
}
