//! Integration tests for host operations running through the session store.

use court_matchmaker::{
    add_players, advance_phase, assign_next_for_court, cancel_match, choose_rotation_pair,
    create_session, finish_match, propose_for_session, remove_player, reset_all, reset_pairing,
    reset_table_stats, set_player_avatar, start_session, update_match_score, AssignOutcome, FinishMatch, Lineup,
    MatchId, MatchStatus, MemoryStore, OddMode, PairKey, Phase, SessionConfig, SessionError,
    SessionId, SessionRecord, SessionStore, MAX_COURTS,
};
use std::cell::Cell;
use std::collections::HashSet;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Player{i}")).collect()
}

fn started_session(store: &MemoryStore, players: usize, courts: u32) -> SessionId {
    let config = SessionConfig {
        court_count: courts,
        odd_mode: OddMode::ThreePlayerRotation,
        target_score: 21,
    };
    let id = create_session(store, config).unwrap();
    add_players(store, id, &names(players)).unwrap();
    start_session(store, id).unwrap();
    id
}

fn assigned(outcome: AssignOutcome) -> MatchId {
    match outcome {
        AssignOutcome::Assigned { match_id } => match_id,
        other => panic!("expected an assignment, got {other:?}"),
    }
}

fn win_for_a(store: &MemoryStore, id: SessionId, match_id: MatchId) {
    let rec = store.snapshot(id).unwrap();
    let winner = rec.match_by_id(match_id).unwrap().team_a;
    finish_match(
        store,
        id,
        match_id,
        FinishMatch {
            winner,
            ..FinishMatch::default()
        },
    )
    .unwrap();
}

fn assert_invariants(rec: &SessionRecord) {
    let s = &rec.session;
    assert!(s.active_teams.is_disjoint(&s.queue_teams), "team both active and queued");
    for t in rec.teams.iter().filter(|t| t.is_active) {
        assert!(s.active_teams.contains(&t.id), "active flag without active_teams entry");
    }
    let mut on_court = HashSet::new();
    for m in rec.matches.iter().filter(|m| m.status == MatchStatus::InProgress) {
        assert!(on_court.insert(m.team_a), "team in two live matches");
        assert!(on_court.insert(m.team_b), "team in two live matches");
    }
    for c in &rec.courts {
        let live = rec
            .matches
            .iter()
            .find(|m| m.court_id == c.id && m.status == MatchStatus::InProgress)
            .map(|m| m.id);
        assert_eq!(c.current_match_id, live, "court {} out of sync", c.id);
    }
}

#[test]
fn start_requires_four_players() {
    let store = MemoryStore::new();
    let id = create_session(&store, SessionConfig::default()).unwrap();
    add_players(&store, id, &names(3)).unwrap();
    assert_eq!(
        start_session(&store, id),
        Err(SessionError::NotEnoughPlayers { have: 3 })
    );
    let rec = store.snapshot(id).unwrap();
    assert!(!rec.session.locked);
    assert!(rec.teams.is_empty());
}

#[test]
fn zero_courts_is_rejected() {
    let store = MemoryStore::new();
    let config = SessionConfig {
        court_count: 0,
        ..SessionConfig::default()
    };
    assert!(matches!(create_session(&store, config), Err(SessionError::InvalidConfig(_))));
    assert!(store.is_empty().unwrap());
}

#[test]
fn too_many_courts_is_rejected() {
    let store = MemoryStore::new();
    let config = SessionConfig {
        court_count: MAX_COURTS + 1,
        ..SessionConfig::default()
    };
    assert!(matches!(create_session(&store, config), Err(SessionError::InvalidConfig(_))));
    let config = SessionConfig {
        court_count: 4_000_000_000,
        ..SessionConfig::default()
    };
    assert!(matches!(create_session(&store, config), Err(SessionError::InvalidConfig(_))));
    assert!(store.is_empty().unwrap());

    let config = SessionConfig {
        court_count: MAX_COURTS,
        ..SessionConfig::default()
    };
    let id = create_session(&store, config).unwrap();
    assert_eq!(store.snapshot(id).unwrap().courts.len(), MAX_COURTS as usize);
}

#[test]
fn avatar_can_be_set_and_cleared() {
    let store = MemoryStore::new();
    let id = create_session(&store, SessionConfig::default()).unwrap();
    let added = add_players(&store, id, &names(4)).unwrap();

    set_player_avatar(&store, id, added[0], Some("data:image/jpeg;base64,AAAA".into())).unwrap();
    let rec = store.snapshot(id).unwrap();
    assert_eq!(
        rec.player(added[0]).unwrap().avatar.as_deref(),
        Some("data:image/jpeg;base64,AAAA")
    );
    assert!(rec.player(added[1]).unwrap().avatar.is_none());

    // Still editable once play has started.
    start_session(&store, id).unwrap();
    set_player_avatar(&store, id, added[0], None).unwrap();
    assert!(store.snapshot(id).unwrap().player(added[0]).unwrap().avatar.is_none());

    set_player_avatar(&store, id, added[1], Some("   ".into())).unwrap();
    assert!(store.snapshot(id).unwrap().player(added[1]).unwrap().avatar.is_none());

    let stranger = uuid::Uuid::new_v4();
    assert_eq!(
        set_player_avatar(&store, id, stranger, Some("x".into())),
        Err(SessionError::PlayerNotFound(stranger))
    );
}

#[test]
fn poisoned_store_reports_an_error() {
    let store = MemoryStore::new();
    let id = create_session(&store, SessionConfig::default()).unwrap();
    assert_eq!(store.len(), Ok(1));

    let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = store.transact(id, |_| -> Result<(), SessionError> {
            panic!("writer died holding the lock")
        });
    }));
    assert!(panicked.is_err());

    assert_eq!(store.len(), Err(SessionError::LockPoisoned));
    assert_eq!(store.is_empty(), Err(SessionError::LockPoisoned));
    assert!(matches!(store.snapshot(id), Err(SessionError::LockPoisoned)));
}

#[test]
fn unknown_session_is_rejected() {
    let store = MemoryStore::new();
    let missing = uuid::Uuid::new_v4();
    assert_eq!(
        start_session(&store, missing),
        Err(SessionError::SessionNotFound(missing))
    );
}

#[test]
fn roster_edits_are_validated_and_locked_after_start() {
    let store = MemoryStore::new();
    let id = create_session(&store, SessionConfig::default()).unwrap();
    add_players(&store, id, &names(4)).unwrap();

    assert_eq!(
        add_players(&store, id, &["player0".to_string()]),
        Err(SessionError::DuplicatePlayerName("player0".to_string()))
    );
    assert_eq!(add_players(&store, id, &["  ".to_string()]), Err(SessionError::EmptyPlayerName));
    // A failed batch leaves nothing behind.
    assert!(add_players(&store, id, &["New".to_string(), "new".to_string()]).is_err());
    assert_eq!(store.snapshot(id).unwrap().players.len(), 4);

    start_session(&store, id).unwrap();
    assert_eq!(add_players(&store, id, &["Late".to_string()]), Err(SessionError::RosterLocked));
    let someone = store.snapshot(id).unwrap().players[0].id;
    assert_eq!(remove_player(&store, id, someone), Err(SessionError::RosterLocked));
    assert_eq!(start_session(&store, id), Err(SessionError::AlreadyStarted));
}

#[test]
fn start_queues_every_team_in_coverage() {
    let store = MemoryStore::new();
    let id = started_session(&store, 9, 2);
    let rec = store.snapshot(id).unwrap();
    assert!(rec.session.locked);
    assert!(rec.session.started_at.is_some());
    assert_eq!(rec.session.phase, Phase::Coverage);
    assert_eq!(rec.teams.len(), 4);
    assert_eq!(rec.session.queue_teams.len(), 4);
    assert!(rec.session.active_teams.is_empty());
    // 3 pairs + 3 pairs inside the rotation team.
    assert_eq!(rec.session.teammate_history.len(), 6);
    assert_invariants(&rec);
}

#[test]
fn assignment_activates_both_teams_and_occupies_court() {
    let store = MemoryStore::new();
    let id = started_session(&store, 8, 2);

    let m1 = assigned(assign_next_for_court(&store, id, 1).unwrap());
    let rec = store.snapshot(id).unwrap();
    let m = rec.match_by_id(m1).unwrap();
    assert_eq!(m.status, MatchStatus::InProgress);
    assert!(rec.team(m.team_a).unwrap().is_active);
    assert!(rec.team(m.team_b).unwrap().is_active);
    assert_eq!(rec.court(1).unwrap().current_match_id, Some(m1));
    assert_invariants(&rec);

    assert_eq!(
        assign_next_for_court(&store, id, 1),
        Err(SessionError::CourtOccupied(1))
    );
    assert_eq!(
        assign_next_for_court(&store, id, 9),
        Err(SessionError::CourtNotFound(9))
    );

    let m2 = assigned(assign_next_for_court(&store, id, 2).unwrap());
    let rec = store.snapshot(id).unwrap();
    let first = rec.match_by_id(m1).unwrap();
    let second = rec.match_by_id(m2).unwrap();
    let teams: HashSet<_> = [first.team_a, first.team_b, second.team_a, second.team_b].into();
    assert_eq!(teams.len(), 4);
    assert!(rec.session.queue_teams.is_empty());
    assert_invariants(&rec);
}

#[test]
fn court_stays_idle_when_no_team_is_free() {
    let store = MemoryStore::new();
    let id = started_session(&store, 4, 2);
    assigned(assign_next_for_court(&store, id, 1).unwrap());
    assert_eq!(assign_next_for_court(&store, id, 2), Ok(AssignOutcome::Idle));
    assert_eq!(propose_for_session(&store, id), Ok(None));
    assert!(store.snapshot(id).unwrap().court(2).unwrap().is_idle());
}

#[test]
fn finish_records_result_and_frees_teams() {
    let store = MemoryStore::new();
    let id = started_session(&store, 4, 1);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    let before = store.snapshot(id).unwrap();
    let m = before.match_by_id(match_id).unwrap().clone();

    finish_match(
        &store,
        id,
        match_id,
        FinishMatch {
            winner: m.team_b,
            score_a: Some(15),
            score_b: Some(21),
            ..FinishMatch::default()
        },
    )
    .unwrap();

    let rec = store.snapshot(id).unwrap();
    let stored = rec.match_by_id(match_id).unwrap();
    assert_eq!(stored.status, MatchStatus::Finished);
    assert_eq!(stored.winner, Some(m.team_b));
    assert!(stored.ended_at.is_some());
    let a = rec.team(m.team_a).unwrap();
    let b = rec.team(m.team_b).unwrap();
    assert_eq!((a.stats.played, a.stats.wins, a.stats.losses), (1, 0, 1));
    assert_eq!((b.stats.played, b.stats.wins, b.stats.losses), (1, 1, 0));
    for pid in b.members() {
        let p = rec.player(*pid).unwrap();
        assert_eq!(p.stats.wins, 1);
        assert_eq!(p.play_history.len(), 1);
    }
    assert!(rec.session.met_history.contains(&PairKey::new(m.team_b, m.team_a)));
    assert_eq!(rec.session.queue_teams.len(), 2);
    assert!(rec.court(1).unwrap().is_idle());
    assert_eq!(rec.results.len(), 1);
    assert_eq!(rec.results[0].score_b, Some(21));
    assert_invariants(&rec);

    // Finishing again changes nothing.
    win_for_a(&store, id, match_id);
    assert_eq!(store.snapshot(id).unwrap().results.len(), 1);
}

#[test]
fn finished_pair_is_never_proposed_again() {
    let store = MemoryStore::new();
    let id = started_session(&store, 4, 1);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    win_for_a(&store, id, match_id);
    assert_eq!(advance_phase(&store, id), Ok(Phase::Bracket));
    assert_eq!(propose_for_session(&store, id), Ok(None));
    assert_eq!(assign_next_for_court(&store, id, 1), Ok(AssignOutcome::Idle));
}

#[test]
fn winner_must_be_in_the_match() {
    let store = MemoryStore::new();
    let id = started_session(&store, 6, 1);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    let rec = store.snapshot(id).unwrap();
    let m = rec.match_by_id(match_id).unwrap();
    let outsider = rec.teams.iter().find(|t| !m.involves(t.id)).unwrap().id;

    let result = finish_match(
        &store,
        id,
        match_id,
        FinishMatch {
            winner: outsider,
            ..FinishMatch::default()
        },
    );
    assert_eq!(
        result,
        Err(SessionError::WinnerNotInMatch {
            match_id,
            winner: outsider
        })
    );
    let after = store.snapshot(id).unwrap();
    assert_eq!(after.match_by_id(match_id).unwrap().status, MatchStatus::InProgress);
    assert!(after.results.is_empty());
}

#[test]
fn cancel_returns_teams_to_queue() {
    let store = MemoryStore::new();
    let id = started_session(&store, 4, 1);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    cancel_match(&store, id, match_id).unwrap();

    let rec = store.snapshot(id).unwrap();
    assert_eq!(rec.match_by_id(match_id).unwrap().status, MatchStatus::Canceled);
    assert!(rec.session.active_teams.is_empty());
    assert_eq!(rec.session.queue_teams.len(), 2);
    assert!(rec.teams.iter().all(|t| !t.is_active && t.stats.played == 0));
    assert!(rec.session.met_history.is_empty());
    assert!(rec.court(1).unwrap().is_idle());
    assert_invariants(&rec);

    // A canceled pairing may still be proposed.
    assigned(assign_next_for_court(&store, id, 1).unwrap());
}

#[test]
fn score_can_be_updated_before_finish() {
    let store = MemoryStore::new();
    let id = started_session(&store, 4, 1);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    update_match_score(&store, id, match_id, 11, 9).unwrap();
    win_for_a(&store, id, match_id);
    let rec = store.snapshot(id).unwrap();
    assert_eq!(rec.results[0].score_a, Some(11));
    assert_eq!(rec.results[0].score_b, Some(9));
}

#[test]
fn rotation_team_advances_and_only_players_on_court_are_credited() {
    let store = MemoryStore::new();
    // 5 players: one pair and one 3-player team.
    let id = started_session(&store, 5, 1);
    let rec = store.snapshot(id).unwrap();
    let rotation = rec.teams.iter().find(|t| t.is_rotation()).unwrap().clone();
    let Lineup::Rotation { players, pair_preference, .. } = rotation.lineup.clone() else {
        panic!("expected a rotation lineup");
    };
    assert_eq!(pair_preference, [players[0], players[1]]);

    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    finish_match(
        &store,
        id,
        match_id,
        FinishMatch {
            winner: rotation.id,
            ..FinishMatch::default()
        },
    )
    .unwrap();

    let rec = store.snapshot(id).unwrap();
    let team = rec.team(rotation.id).unwrap();
    assert_eq!(team.rotation_index(), Some(1));
    match &team.lineup {
        Lineup::Rotation {
            pair_preference,
            pending_odd_choice,
            ..
        } => {
            assert_eq!(*pair_preference, [players[1], players[2]]);
            assert!(*pending_odd_choice);
        }
        Lineup::Pair { .. } => panic!("lineup shape changed"),
    }
    assert_eq!(rec.player(players[0]).unwrap().stats.played, 1);
    assert_eq!(rec.player(players[1]).unwrap().stats.played, 1);
    assert_eq!(rec.player(players[2]).unwrap().stats.played, 0);
    let stored = rec.match_by_id(match_id).unwrap();
    let played = if stored.team_a == rotation.id {
        stored.team_a_played.clone()
    } else {
        stored.team_b_played.clone()
    };
    assert_eq!(played, Some(vec![players[0], players[1]]));
}

#[test]
fn rotation_index_is_matches_mod_three() {
    let [a, b, c] = [0; 3].map(|_| uuid::Uuid::new_v4());
    let mut team = court_matchmaker::Team::rotation(a, b, c);
    for n in 1..=7u32 {
        team.record_finish(n % 2 == 0);
        assert_eq!(team.rotation_index(), Some((n % 3) as u8));
    }
    assert_eq!(team.stats.played, 7);
}

#[test]
fn host_can_choose_who_plays_for_rotation_team() {
    let store = MemoryStore::new();
    let id = started_session(&store, 5, 1);
    let rec = store.snapshot(id).unwrap();
    let rotation = rec.teams.iter().find(|t| t.is_rotation()).unwrap().clone();
    let pair_team = rec.teams.iter().find(|t| !t.is_rotation()).unwrap().clone();
    let m = rotation.members().to_vec();

    assert_eq!(
        choose_rotation_pair(&store, id, rotation.id, [m[0], m[0]]),
        Err(SessionError::InvalidLineup(rotation.id))
    );
    assert_eq!(
        choose_rotation_pair(&store, id, pair_team.id, [pair_team.members()[0], pair_team.members()[1]]),
        Err(SessionError::InvalidLineup(pair_team.id))
    );
    choose_rotation_pair(&store, id, rotation.id, [m[2], m[0]]).unwrap();

    let rec = store.snapshot(id).unwrap();
    match &rec.team(rotation.id).unwrap().lineup {
        Lineup::Rotation {
            pair_preference,
            pending_odd_choice,
            ..
        } => {
            assert_eq!(*pair_preference, [m[2], m[0]]);
            assert!(!*pending_odd_choice);
        }
        Lineup::Pair { .. } => panic!("lineup shape changed"),
    }

    // An explicit played list overrides the preference, and must name two members.
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    let rec = store.snapshot(id).unwrap();
    let stored = rec.match_by_id(match_id).unwrap().clone();
    let (a_played, b_played) = if stored.team_a == rotation.id {
        (Some(m.clone()), None)
    } else {
        (None, Some(m.clone()))
    };
    let bad = finish_match(
        &store,
        id,
        match_id,
        FinishMatch {
            winner: rotation.id,
            team_a_played: a_played,
            team_b_played: b_played,
            ..FinishMatch::default()
        },
    );
    assert_eq!(bad, Err(SessionError::InvalidLineup(rotation.id)));

    let (a_played, b_played) = if stored.team_a == rotation.id {
        (Some(vec![m[1], m[2]]), None)
    } else {
        (None, Some(vec![m[1], m[2]]))
    };
    finish_match(
        &store,
        id,
        match_id,
        FinishMatch {
            winner: rotation.id,
            team_a_played: a_played,
            team_b_played: b_played,
            ..FinishMatch::default()
        },
    )
    .unwrap();
    let rec = store.snapshot(id).unwrap();
    assert_eq!(rec.player(m[0]).unwrap().stats.played, 0);
    assert_eq!(rec.player(m[1]).unwrap().stats.wins, 1);
    assert_eq!(rec.player(m[2]).unwrap().stats.wins, 1);
}

#[test]
fn single_court_plays_every_pairing_exactly_once() {
    let store = MemoryStore::new();
    let id = started_session(&store, 8, 1);
    let mut seen = HashSet::new();
    loop {
        match assign_next_for_court(&store, id, 1).unwrap() {
            AssignOutcome::Assigned { match_id } => {
                let rec = store.snapshot(id).unwrap();
                let m = rec.match_by_id(match_id).unwrap();
                assert!(seen.insert(PairKey::new(m.team_a, m.team_b)), "repeat pairing");
                assert_invariants(&rec);
                win_for_a(&store, id, match_id);
                advance_phase(&store, id).unwrap();
            }
            AssignOutcome::Idle => break,
            AssignOutcome::Conflict => panic!("no concurrent writers here"),
        }
    }
    // 4 teams: every one of the 6 pairings, then nothing left.
    assert_eq!(seen.len(), 6);
    let rec = store.snapshot(id).unwrap();
    assert_eq!(rec.session.phase, Phase::Bracket);
    assert_eq!(rec.results.len(), 6);
    assert!(rec.results.iter().any(|r| !r.is_fallback));
}

#[test]
fn coverage_gives_every_team_a_match_before_bracket() {
    let store = MemoryStore::new();
    let id = started_session(&store, 8, 2);
    let m1 = assigned(assign_next_for_court(&store, id, 1).unwrap());
    let m2 = assigned(assign_next_for_court(&store, id, 2).unwrap());
    win_for_a(&store, id, m1);
    assert_eq!(advance_phase(&store, id), Ok(Phase::Coverage));
    win_for_a(&store, id, m2);
    assert_eq!(advance_phase(&store, id), Ok(Phase::Bracket));

    // Winners meet winners first.
    let m3 = assigned(assign_next_for_court(&store, id, 1).unwrap());
    let rec = store.snapshot(id).unwrap();
    let m = rec.match_by_id(m3).unwrap();
    assert!(rec.team(m.team_a).unwrap().stats.is_winning());
    assert!(rec.team(m.team_b).unwrap().stats.is_winning());
    assert!(!m.is_fallback);
}

/// Store that lets another host grab a court between the snapshot and the commit.
struct RacingStore {
    inner: MemoryStore,
    interfere_on_court: Cell<Option<u32>>,
}

impl SessionStore for RacingStore {
    fn insert(&self, record: SessionRecord) -> Result<(), SessionError> {
        self.inner.insert(record)
    }

    fn snapshot(&self, id: SessionId) -> Result<SessionRecord, SessionError> {
        let snap = self.inner.snapshot(id)?;
        if let Some(court) = self.interfere_on_court.take() {
            assign_next_for_court(&self.inner, id, court)?;
        }
        Ok(snap)
    }

    fn transact<T, F>(&self, id: SessionId, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut SessionRecord) -> Result<T, SessionError>,
    {
        self.inner.transact(id, f)
    }
}

#[test]
fn stale_proposal_is_not_committed() {
    let store = RacingStore {
        inner: MemoryStore::new(),
        interfere_on_court: Cell::new(None),
    };
    let id = create_session(&store, SessionConfig::default()).unwrap();
    add_players(&store, id, &names(4)).unwrap();
    start_session(&store, id).unwrap();

    store.interfere_on_court.set(Some(2));
    assert_eq!(assign_next_for_court(&store, id, 1), Ok(AssignOutcome::Conflict));

    let rec = store.inner.snapshot(id).unwrap();
    assert_eq!(rec.matches.len(), 1);
    assert_eq!(rec.matches[0].court_id, 2);
    assert!(rec.court(1).unwrap().is_idle());
    assert_invariants(&rec);
}

#[test]
fn concurrent_assignments_keep_invariants() {
    let store = MemoryStore::new();
    let id = started_session(&store, 12, 6);
    let outcomes: Vec<AssignOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (1..=6)
            .map(|court| {
                let store = &store;
                scope.spawn(move || assign_next_for_court(store, id, court).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let assigned_count = outcomes
        .iter()
        .filter(|o| matches!(o, AssignOutcome::Assigned { .. }))
        .count();
    assert!((1..=3).contains(&assigned_count));
    let rec = store.snapshot(id).unwrap();
    assert_eq!(rec.matches.len(), assigned_count);
    assert_invariants(&rec);
}

#[test]
fn reset_pairing_requires_a_started_session() {
    let store = MemoryStore::new();
    let id = create_session(&store, SessionConfig::default()).unwrap();
    add_players(&store, id, &names(4)).unwrap();

    assert_eq!(reset_pairing(&store, id), Err(SessionError::NotStarted));
    let rec = store.snapshot(id).unwrap();
    assert!(rec.teams.is_empty());
    assert!(rec.session.queue_teams.is_empty());
    assert!(!rec.session.locked);
    assert_eq!(assign_next_for_court(&store, id, 1).unwrap(), AssignOutcome::Idle);
    assert!(store.snapshot(id).unwrap().matches.is_empty());
}

#[test]
fn reset_pairing_archives_old_teams_and_keeps_history() {
    let store = MemoryStore::new();
    let id = started_session(&store, 8, 2);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    win_for_a(&store, id, match_id);
    assigned(assign_next_for_court(&store, id, 2).unwrap());
    let before = store.snapshot(id).unwrap();
    let old_history = before.session.teammate_history.clone();
    let old_ids: HashSet<_> = before.teams.iter().map(|t| t.id).collect();

    reset_pairing(&store, id).unwrap();

    let rec = store.snapshot(id).unwrap();
    assert_eq!(rec.session.phase, Phase::Coverage);
    assert!(rec.matches.is_empty());
    assert!(rec.courts.iter().all(|c| c.is_idle()));
    assert!(rec.session.active_teams.is_empty());
    assert_eq!(rec.session.met_history.len(), 1);
    assert!(rec.session.teammate_history.is_superset(&old_history));
    let live = rec.live_teams();
    assert_eq!(live.len(), 4);
    assert!(live.iter().all(|t| !old_ids.contains(&t.id) && !t.is_rotation()));
    assert!(rec
        .teams
        .iter()
        .filter(|t| old_ids.contains(&t.id))
        .all(|t| t.archived && !t.is_active));
    let queued: HashSet<_> = live.iter().map(|t| t.id).collect();
    assert_eq!(rec.session.queue_teams, queued);
    // Player stats survive a re-pair.
    assert_eq!(rec.players.iter().map(|p| p.stats.played).sum::<u32>(), 4);
    assert_invariants(&rec);

    // Archived teams are never scheduled again.
    let next = assigned(assign_next_for_court(&store, id, 1).unwrap());
    let m = store.snapshot(id).unwrap().match_by_id(next).unwrap().clone();
    assert!(!old_ids.contains(&m.team_a) && !old_ids.contains(&m.team_b));
}

#[test]
fn table_stats_reset_clears_player_counters() {
    let store = MemoryStore::new();
    let id = started_session(&store, 4, 1);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    win_for_a(&store, id, match_id);
    reset_table_stats(&store, id).unwrap();
    let rec = store.snapshot(id).unwrap();
    assert!(rec.players.iter().all(|p| p.stats.played == 0 && p.play_history.is_empty()));
    assert_eq!(rec.results.len(), 1);
}

#[test]
fn full_reset_unlocks_and_optionally_keeps_names() {
    let store = MemoryStore::new();
    let id = started_session(&store, 5, 1);
    let match_id = assigned(assign_next_for_court(&store, id, 1).unwrap());
    win_for_a(&store, id, match_id);

    reset_all(&store, id, true).unwrap();
    let rec = store.snapshot(id).unwrap();
    assert!(!rec.session.locked);
    assert!(rec.session.started_at.is_none());
    assert!(rec.teams.is_empty() && rec.matches.is_empty() && rec.results.is_empty());
    assert!(rec.session.met_history.is_empty() && rec.session.teammate_history.is_empty());
    assert_eq!(rec.players.len(), 5);
    assert!(rec.players.iter().all(|p| p.stats.played == 0));

    // Unlocked again: the roster can be edited and the session restarted.
    remove_player(&store, id, rec.players[0].id).unwrap();
    start_session(&store, id).unwrap();

    reset_all(&store, id, false).unwrap();
    assert!(store.snapshot(id).unwrap().players.is_empty());
}
