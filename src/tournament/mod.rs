//! Single-elimination tournaments: bracket construction, winner advancement, stat
//! aggregation and the runner that ties them to the resolver.

pub mod advance;
pub mod builder;
pub mod error;
pub mod model;
pub mod runner;
pub mod stats;

pub use advance::{
    advance, champion, is_complete, promote_lone_fighters, ready_matches, round_settled,
};
pub use builder::{build_brackets, matches_in_round, round_count};
pub use error::TournamentError;
pub use model::{
    MatchNarrative, MatchStatus, Tournament, TournamentBracket, TournamentMatch, TournamentStatus,
};
pub use runner::{MatchReport, TournamentEvent, TournamentRunner, TournamentSettings};
pub use stats::{
    classify_moment, fighting_style, init_stats, update_stats, FighterTournamentStats,
    MomentKind, NotableMoment, StatsTable,
};
