//! Court matchmaker: team building and next-match proposals for multi-court doubles sessions.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    add_players, advance_phase, assign_next_for_court, begin_match, build_initial_teams,
    cancel_match, choose_rotation_pair, create_session, finish_match, next_phase, parse_roster,
    propose_for_session, propose_next_match, rebuild_teams_avoiding_teammates, remove_player,
    reset_all, reset_pairing, reset_table_stats, set_player_avatar, start_session, teammate_history_from_teams,
    update_match_score, AssignOutcome, FinishMatch, PairingWarning, ProposedMatch, TeamBuild,
};
pub use models::{
    Court, CourtId, CourtMatch, Lineup, MatchId, MatchStats, MatchStatus, OddMode, PairKey, Phase,
    Player, PlayerId, ResultRow, Session, SessionConfig, SessionError, SessionId, SessionRecord,
    Team, TeamId, MAX_COURTS,
};
pub use store::{MemoryStore, SessionStore};
