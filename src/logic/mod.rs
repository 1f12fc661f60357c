//! Matchmaking logic: team building, constraints, proposals, phases, and session operations.

pub mod constraints;
mod pairing;
mod phase;
mod roster;
mod scheduler;
mod session_ops;

pub use pairing::{
    build_initial_teams, build_initial_teams_with_rng, rebuild_teams_avoiding_teammates,
    rebuild_teams_avoiding_teammates_with_rng, teammate_history_from_teams, PairingWarning,
    TeamBuild, MIN_PLAYERS,
};
pub use phase::next_phase;
pub use roster::parse_roster;
pub use scheduler::{propose_next_match, ProposedMatch};
pub use session_ops::{
    add_players, advance_phase, assign_next_for_court, begin_match, cancel_match,
    choose_rotation_pair, create_session, finish_match, propose_for_session, remove_player,
    reset_all, reset_pairing, reset_table_stats, set_player_avatar, start_session,
    update_match_score,
    AssignOutcome, FinishMatch,
};
