//! Data structures for a matchmaking session: players, teams, courts, matches, session state.

mod court;
mod player;
mod session;
mod team;

pub use court::{Court, CourtId, CourtMatch, MatchId, MatchStatus, ResultRow};
pub use player::{MatchStats, Player, PlayerId};
pub use session::{
    OddMode, PairKey, Phase, Session, SessionConfig, SessionError, SessionId, SessionRecord,
    MAX_COURTS,
};
pub use team::{Lineup, Team, TeamId};
