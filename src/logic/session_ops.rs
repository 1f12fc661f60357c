//! Host operations on a session, each committed through the store's transaction primitive.
//!
//! Court assignment is two-phase: the proposal is computed from a snapshot outside
//! the transaction, then the transaction re-checks that both teams are still free
//! before writing anything.

use crate::logic::constraints::has_met;
use crate::logic::pairing::{
    build_initial_teams, rebuild_teams_avoiding_teammates, teammate_history_from_teams,
    PairingWarning, MIN_PLAYERS,
};
use crate::logic::phase::next_phase;
use crate::logic::scheduler::{propose_next_match, ProposedMatch};
use crate::models::{
    CourtId, CourtMatch, MatchId, MatchStatus, PairKey, Phase, Player, PlayerId, ResultRow,
    SessionConfig, SessionError, SessionId, SessionRecord, TeamId,
};
use crate::store::SessionStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened when a court asked for its next match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignOutcome {
    /// A match was created and is in progress on the court.
    Assigned { match_id: MatchId },
    /// No legal pairing exists; the court stays idle.
    Idle,
    /// The proposal went stale before commit. Nothing was written; ask again.
    Conflict,
}

/// Host-reported outcome of a match.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FinishMatch {
    pub winner: TeamId,
    /// Who played for side A. Defaults to the team's next-on-court pair.
    #[serde(default)]
    pub team_a_played: Option<Vec<PlayerId>>,
    #[serde(default)]
    pub team_b_played: Option<Vec<PlayerId>>,
    #[serde(default)]
    pub score_a: Option<u32>,
    #[serde(default)]
    pub score_b: Option<u32>,
}

/// Create a session with idle courts and an empty roster.
pub fn create_session<S: SessionStore>(
    store: &S,
    config: SessionConfig,
) -> Result<SessionId, SessionError> {
    let record = SessionRecord::new(config)?;
    let id = record.id();
    store.insert(record)?;
    log::info!("Created session {} with {} court(s)", id, config.court_count);
    Ok(id)
}

/// Add players by name. Names are trimmed and must be unique (case-insensitive).
pub fn add_players<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    names: &[String],
) -> Result<Vec<PlayerId>, SessionError> {
    store.transact(session_id, |rec| {
        if rec.session.locked {
            return Err(SessionError::RosterLocked);
        }
        let mut added = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                return Err(SessionError::EmptyPlayerName);
            }
            if rec.players.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
                return Err(SessionError::DuplicatePlayerName(name.to_string()));
            }
            let player = Player::new(name);
            added.push(player.id);
            rec.players.push(player);
        }
        Ok(added)
    })
}

/// Remove a player (only before start, and only if no live team references them).
pub fn remove_player<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    player_id: PlayerId,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        if rec.session.locked {
            return Err(SessionError::RosterLocked);
        }
        rec.player(player_id)?;
        if rec
            .teams
            .iter()
            .any(|t| !t.archived && t.has_member(player_id))
        {
            return Err(SessionError::PlayerInTeam(player_id));
        }
        rec.players.retain(|p| p.id != player_id);
        Ok(())
    })
}

/// Set or clear a player's avatar. Allowed at any time; an empty reference clears it.
pub fn set_player_avatar<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    player_id: PlayerId,
    avatar: Option<String>,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        let player = rec.player_mut(player_id)?;
        player.avatar = avatar.filter(|a| !a.trim().is_empty());
        log::info!(
            "Player {} avatar {}",
            player_id,
            if player.avatar.is_some() { "updated" } else { "cleared" }
        );
        Ok(())
    })
}

/// Lock the roster and build the opening teams. Returns pairing warnings.
pub fn start_session<S: SessionStore>(
    store: &S,
    session_id: SessionId,
) -> Result<Vec<PairingWarning>, SessionError> {
    store.transact(session_id, |rec| {
        if rec.session.locked {
            return Err(SessionError::AlreadyStarted);
        }
        if rec.players.len() < MIN_PLAYERS {
            return Err(SessionError::NotEnoughPlayers {
                have: rec.players.len(),
            });
        }
        let build = build_initial_teams(&rec.session.config, &rec.players);

        for t in &mut rec.teams {
            t.archived = true;
            t.is_active = false;
        }
        let session = &mut rec.session;
        session.locked = true;
        session.started_at = Some(Utc::now());
        session.phase = Phase::Coverage;
        session.active_teams.clear();
        session.queue_teams = build.teams.iter().map(|t| t.id).collect();
        session
            .teammate_history
            .extend(teammate_history_from_teams(&build.teams));

        log::info!(
            "Session {} started: {} players in {} teams",
            session_id,
            rec.players.len(),
            build.teams.len()
        );
        rec.teams.extend(build.teams);
        Ok(build.warnings)
    })
}

/// Preview the next match from a snapshot without committing anything.
pub fn propose_for_session<S: SessionStore>(
    store: &S,
    session_id: SessionId,
) -> Result<Option<ProposedMatch>, SessionError> {
    let rec = store.snapshot(session_id)?;
    Ok(propose_next_match(&rec.session, &rec.live_teams()))
}

/// True if the team exists, is live, and is not on court by either record.
fn team_is_free(rec: &SessionRecord, team_id: TeamId) -> Result<bool, SessionError> {
    let team = rec.team(team_id)?;
    Ok(!team.archived && !team.is_active && !rec.session.active_teams.contains(&team_id))
}

/// Propose from a snapshot, then validate and commit in one transaction.
pub fn assign_next_for_court<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    court_id: CourtId,
) -> Result<AssignOutcome, SessionError> {
    let snapshot = store.snapshot(session_id)?;
    if !snapshot.court(court_id)?.is_idle() {
        return Err(SessionError::CourtOccupied(court_id));
    }
    let proposal = propose_next_match(&snapshot.session, &snapshot.live_teams());

    store.transact(session_id, |rec| {
        if !rec.court(court_id)?.is_idle() {
            return Err(SessionError::CourtOccupied(court_id));
        }
        let Some(p) = proposal else {
            return Ok(AssignOutcome::Idle);
        };
        if !team_is_free(rec, p.team_a)?
            || !team_is_free(rec, p.team_b)?
            || has_met(&rec.session, p.team_a, p.team_b)
        {
            log::warn!(
                "Stale proposal for court {}: {} vs {} no longer valid",
                court_id,
                p.team_a,
                p.team_b
            );
            return Ok(AssignOutcome::Conflict);
        }

        let m = CourtMatch::start_now(court_id, p.team_a, p.team_b, p.is_fallback);
        let match_id = m.id;
        rec.team_mut(p.team_a)?.is_active = true;
        rec.team_mut(p.team_b)?.is_active = true;
        rec.session.activate(&[p.team_a, p.team_b]);
        rec.court_mut(court_id)?.current_match_id = Some(match_id);
        rec.matches.push(m);

        log::info!(
            "Court {}: {} vs {}{}",
            court_id,
            p.team_a,
            p.team_b,
            if p.is_fallback { " (fallback)" } else { "" }
        );
        Ok(AssignOutcome::Assigned { match_id })
    })
}

/// Start a scheduled match. Any other status is left as is.
pub fn begin_match<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    match_id: MatchId,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        let m = rec.match_by_id(match_id)?;
        if m.status != MatchStatus::Scheduled {
            return Ok(());
        }
        let court_id = m.court_id;
        let court = rec.court_mut(court_id)?;
        match court.current_match_id {
            Some(other) if other != match_id => return Err(SessionError::CourtOccupied(court_id)),
            _ => court.current_match_id = Some(match_id),
        }
        let m = rec.match_mut(match_id)?;
        m.status = MatchStatus::InProgress;
        m.started_at = Some(Utc::now());
        Ok(())
    })
}

/// Take both teams off court and back into the queue, and free the court.
fn release_match(rec: &mut SessionRecord, m: &CourtMatch) -> Result<(), SessionError> {
    rec.session.release(&[m.team_a, m.team_b]);
    let court = rec.court_mut(m.court_id)?;
    if court.current_match_id == Some(m.id) {
        court.current_match_id = None;
    }
    Ok(())
}

/// Cancel a match without recording a result. Closed matches are left alone.
pub fn cancel_match<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    match_id: MatchId,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        let m = rec.match_by_id(match_id)?.clone();
        if m.status.is_closed() {
            return Ok(());
        }
        rec.team_mut(m.team_a)?.is_active = false;
        rec.team_mut(m.team_b)?.is_active = false;
        release_match(rec, &m)?;

        let stored = rec.match_mut(match_id)?;
        stored.status = MatchStatus::Canceled;
        stored.ended_at = Some(Utc::now());
        log::info!("Canceled match {} on court {}", match_id, m.court_id);
        Ok(())
    })
}

/// Record a result: stats, rotation, met history, result log, and free the court.
pub fn finish_match<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    match_id: MatchId,
    finish: FinishMatch,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        let m = rec.match_by_id(match_id)?.clone();
        if m.status.is_closed() {
            return Ok(());
        }
        if !m.involves(finish.winner) {
            return Err(SessionError::WinnerNotInMatch {
                match_id,
                winner: finish.winner,
            });
        }

        let team_a_played = played_for(rec, m.team_a, finish.team_a_played)?;
        let team_b_played = played_for(rec, m.team_b, finish.team_b_played)?;
        let a_won = finish.winner == m.team_a;
        let ended_at = Utc::now();

        rec.team_mut(m.team_a)?.record_finish(a_won);
        rec.team_mut(m.team_b)?.record_finish(!a_won);

        let sides = [(&team_a_played, a_won), (&team_b_played, !a_won)];
        for (played, won) in sides {
            for pid in played {
                match rec.player_mut(*pid) {
                    Ok(p) => p.record_match(won, ended_at),
                    Err(_) => log::warn!("Player {} missing while finishing match {}", pid, match_id),
                }
            }
        }

        rec.session.met_history.insert(PairKey::new(m.team_a, m.team_b));
        release_match(rec, &m)?;

        let stored = rec.match_mut(match_id)?;
        stored.status = MatchStatus::Finished;
        stored.ended_at = Some(ended_at);
        stored.winner = Some(finish.winner);
        stored.score_a = finish.score_a.or(stored.score_a);
        stored.score_b = finish.score_b.or(stored.score_b);
        stored.team_a_played = Some(team_a_played.clone());
        stored.team_b_played = Some(team_b_played.clone());
        let row = ResultRow {
            id: Uuid::new_v4(),
            ended_at,
            court_id: m.court_id,
            team_a: m.team_a,
            team_b: m.team_b,
            winner: finish.winner,
            is_fallback: m.is_fallback,
            score_a: stored.score_a,
            score_b: stored.score_b,
            team_a_played,
            team_b_played,
        };
        rec.results.push(row);

        log::info!(
            "Finished match {} on court {}: winner {}",
            match_id,
            m.court_id,
            finish.winner
        );
        Ok(())
    })
}

/// Players who played for a team: the host's list if given, else the team's next-on-court pair.
fn played_for(
    rec: &SessionRecord,
    team_id: TeamId,
    reported: Option<Vec<PlayerId>>,
) -> Result<Vec<PlayerId>, SessionError> {
    let team = rec.team(team_id)?;
    match reported {
        Some(played) => {
            team.validate_played(&played)?;
            Ok(played)
        }
        None => Ok(team.lineup.next_on_court()),
    }
}

pub fn update_match_score<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    match_id: MatchId,
    score_a: u32,
    score_b: u32,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        let m = rec.match_mut(match_id)?;
        m.score_a = Some(score_a);
        m.score_b = Some(score_b);
        Ok(())
    })
}

/// Host decides which two members of a 3-player team play next.
pub fn choose_rotation_pair<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    team_id: TeamId,
    pair: [PlayerId; 2],
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| rec.team_mut(team_id)?.choose_pair(pair))
}

/// Run the phase controller over live teams and persist the result.
pub fn advance_phase<S: SessionStore>(
    store: &S,
    session_id: SessionId,
) -> Result<Phase, SessionError> {
    store.transact(session_id, |rec| {
        let next = next_phase(rec.session.phase, &rec.live_teams());
        if next != rec.session.phase {
            log::info!("Session {} moves to {:?} phase", session_id, next);
            rec.session.phase = next;
        }
        Ok(next)
    })
}

/// Re-pair all players avoiding past teammates. Old teams are archived; met history is kept.
///
/// Only a started session can be re-paired; before that the roster is still open.
pub fn reset_pairing<S: SessionStore>(
    store: &S,
    session_id: SessionId,
) -> Result<Vec<PairingWarning>, SessionError> {
    store.transact(session_id, |rec| {
        if !rec.session.locked {
            return Err(SessionError::NotStarted);
        }
        let build = rebuild_teams_avoiding_teammates(&rec.players, &rec.session.teammate_history);

        for t in &mut rec.teams {
            t.archived = true;
            t.is_active = false;
        }
        rec.matches.clear();
        rec.clear_courts();

        let session = &mut rec.session;
        session.phase = Phase::Coverage;
        session.active_teams.clear();
        session.queue_teams = build.teams.iter().map(|t| t.id).collect();
        session
            .teammate_history
            .extend(teammate_history_from_teams(&build.teams));

        log::info!(
            "Session {} re-paired into {} teams ({} warning(s))",
            session_id,
            build.teams.len(),
            build.warnings.len()
        );
        rec.teams.extend(build.teams);
        Ok(build.warnings)
    })
}

/// Zero every player's stats and play history.
pub fn reset_table_stats<S: SessionStore>(
    store: &S,
    session_id: SessionId,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        rec.players.iter_mut().for_each(Player::reset_stats);
        Ok(())
    })
}

/// Back to an unlocked, empty session. Optionally keep player names (with zeroed stats).
pub fn reset_all<S: SessionStore>(
    store: &S,
    session_id: SessionId,
    keep_names: bool,
) -> Result<(), SessionError> {
    store.transact(session_id, |rec| {
        rec.matches.clear();
        rec.results.clear();
        rec.teams.clear();
        rec.clear_courts();
        if keep_names {
            rec.players.iter_mut().for_each(Player::reset_stats);
        } else {
            rec.players.clear();
        }

        let session = &mut rec.session;
        session.phase = Phase::Coverage;
        session.active_teams.clear();
        session.queue_teams.clear();
        session.teammate_history.clear();
        session.met_history.clear();
        session.started_at = None;
        session.locked = false;

        log::info!("Session {} fully reset (keep_names={})", session_id, keep_names);
        Ok(())
    })
}
