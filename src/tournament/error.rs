use thiserror::Error;

use crate::combat::CombatError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TournamentError {
    #[error("cannot build a bracket from an empty roster")]
    EmptyRoster,

    #[error("fighter id '{0}' appears more than once in the roster")]
    DuplicateFighter(String),

    #[error("fighter name '{0}' appears more than once in the roster")]
    DuplicateName(String),

    #[error("round {round} has unfinished matches but none can be played")]
    Stalled { round: u32 },

    #[error("match {match_id} has no decided winner")]
    UndecidedMatch { match_id: String },

    #[error("match {match_id} is missing a fighter")]
    MissingFighter { match_id: String },

    #[error("fighter '{0}' is not tracked in tournament stats")]
    UnknownFighter(String),

    #[error("fighter '{0}' is already eliminated")]
    FighterEliminated(String),

    #[error(transparent)]
    Combat(#[from] CombatError),
}
