//! Moving winners forward through the bracket.
//!
//! Match `m` of round `r` feeds match `ceil(m/2)` of round `r+1`: odd match numbers fill
//! slot A, even ones slot B. Advancing out of the final round has nowhere to go and is a
//! no-op; completion is read from the bracket itself via [is_complete].

use tracing::{debug, trace};

use crate::combat::Fighter;
use crate::tournament::model::{MatchStatus, TournamentBracket, TournamentMatch};

/// Place `winner` into the next-round slot fed by `completed`.
/// Returns false (and changes nothing) when there is no destination match.
pub fn advance(
    brackets: &mut [TournamentBracket],
    winner: &Fighter,
    completed: &TournamentMatch,
) -> bool {
    let next_round = completed.round + 1;
    let next_match = completed.match_number.div_ceil(2);
    let Some(destination) = brackets
        .iter_mut()
        .find(|b| b.round == next_round)
        .and_then(|b| b.find_match_mut(next_match))
    else {
        trace!(from = %completed.id, "no destination slot; final round");
        return false;
    };

    let slot = if completed.match_number % 2 == 1 {
        &mut destination.fighter_a
    } else {
        &mut destination.fighter_b
    };
    *slot = Some(winner.clone());
    debug!(
        winner = %winner.name,
        from = %completed.id,
        to = %destination.id,
        "advanced winner"
    );
    true
}

/// True once the last bracket's single match is completed.
pub fn is_complete(brackets: &[TournamentBracket]) -> bool {
    brackets
        .last()
        .map(|last| last.matches.len() == 1 && last.matches[0].is_completed())
        .unwrap_or(false)
}

/// Champion of a finished bracket.
pub fn champion(brackets: &[TournamentBracket]) -> Option<&Fighter> {
    if !is_complete(brackets) {
        return None;
    }
    brackets.last()?.matches.first()?.winner.as_ref()
}

/// Matches of `round` with both slots filled that have not been played yet.
pub fn ready_matches(brackets: &[TournamentBracket], round: u32) -> Vec<&TournamentMatch> {
    brackets
        .iter()
        .find(|b| b.round == round)
        .map(|b| b.matches.iter().filter(|m| m.is_ready()).collect())
        .unwrap_or_default()
}

/// A round is settled once every match in it is completed, or left vacant because the
/// rounds feeding it produced nobody for that slot (rosters well short of a power of two).
pub fn round_settled(brackets: &[TournamentBracket], round: u32) -> bool {
    if round == 0 {
        return true;
    }
    let Some(bracket) = brackets.iter().find(|b| b.round == round) else {
        return true;
    };
    let feeders_settled = round == 1 || round_settled(brackets, round - 1);
    feeders_settled
        && bracket
            .matches
            .iter()
            .all(|m| m.is_completed() || m.fighter_count() == 0)
}

/// Once the feeding round is settled, a match in `round` that still holds a single fighter
/// can never be contested; mark it as a bye. Returns the promoted matches so the caller can
/// advance their winners.
pub fn promote_lone_fighters(
    brackets: &mut [TournamentBracket],
    round: u32,
) -> Vec<TournamentMatch> {
    if round > 1 && !round_settled(brackets, round - 1) {
        return Vec::new();
    }
    let Some(bracket) = brackets.iter_mut().find(|b| b.round == round) else {
        return Vec::new();
    };

    let mut promoted = Vec::new();
    for m in bracket.matches.iter_mut() {
        if m.status != MatchStatus::Pending || m.fighter_count() != 1 {
            continue;
        }
        let lone = m.fighter_a.take().or_else(|| m.fighter_b.take());
        m.fighter_a = lone.clone();
        m.winner = lone;
        m.status = MatchStatus::Completed;
        debug!(match_id = %m.id, "lone fighter advances on a bye");
        promoted.push(m.clone());
    }
    promoted
}
