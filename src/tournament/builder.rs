//! Single-elimination bracket construction.
//!
//! Round 1 pairs consecutive fighters of a shuffled roster (`ceil(n/2)` matches, the odd
//! fighter out gets a bye). Later rounds hold `2^(rounds - k)` empty slots that the
//! advancer fills as winners come through.

use std::collections::HashSet;

use tracing::debug;

use crate::combat::{Fighter, RollSource};
use crate::tournament::error::TournamentError;
use crate::tournament::model::{TournamentBracket, TournamentMatch};

/// `ceil(log2(n))`; zero for a roster of one (or none).
pub fn round_count(fighter_count: usize) -> u32 {
    if fighter_count <= 1 {
        0
    } else {
        usize::BITS - (fighter_count - 1).leading_zeros()
    }
}

/// Number of match slots in `round` of a bracket with `rounds` rounds.
/// Round 1 holds `ceil(n/2)` matches; later rounds hold `2^(rounds - round)`.
pub fn matches_in_round(fighter_count: usize, rounds: u32, round: u32) -> usize {
    if round <= 1 {
        fighter_count.div_ceil(2)
    } else {
        1usize << (rounds - round)
    }
}

pub fn build_brackets<R: RollSource>(
    fighters: &[Fighter],
    rolls: &mut R,
) -> Result<Vec<TournamentBracket>, TournamentError> {
    if fighters.is_empty() {
        return Err(TournamentError::EmptyRoster);
    }
    // Verdicts and damage totals name fighters, so names must be unique as well as ids.
    let mut ids = HashSet::with_capacity(fighters.len());
    let mut names = HashSet::with_capacity(fighters.len());
    for fighter in fighters {
        if !ids.insert(fighter.id.as_str()) {
            return Err(TournamentError::DuplicateFighter(fighter.id.clone()));
        }
        if !names.insert(fighter.name.as_str()) {
            return Err(TournamentError::DuplicateName(fighter.name.clone()));
        }
    }

    let mut seeded = fighters.to_vec();
    rolls.shuffle(&mut seeded);

    let rounds = round_count(seeded.len());
    debug!(fighters = seeded.len(), rounds, "building bracket");

    let mut first_round = Vec::with_capacity(matches_in_round(seeded.len(), rounds, 1));
    let mut pairs = seeded.into_iter();
    let mut match_number = 1;
    while let Some(first) = pairs.next() {
        let entry = match pairs.next() {
            Some(second) => TournamentMatch {
                fighter_a: Some(first),
                fighter_b: Some(second),
                ..TournamentMatch::empty(1, match_number)
            },
            None => TournamentMatch::bye(1, match_number, first),
        };
        first_round.push(entry);
        match_number += 1;
    }

    let mut brackets = vec![TournamentBracket {
        round: 1,
        matches: first_round,
    }];
    for round in 2..=rounds {
        let slots = matches_in_round(fighters.len(), rounds, round);
        brackets.push(TournamentBracket {
            round,
            matches: (1..=slots as u32)
                .map(|number| TournamentMatch::empty(round, number))
                .collect(),
        });
    }
    Ok(brackets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Rng, Stats};
    use crate::tournament::model::MatchStatus;

    fn roster(n: usize) -> Vec<Fighter> {
        (1..=n)
            .map(|i| Fighter::new(format!("f{i}"), format!("Fighter {i}"), Stats::new(100, 10)))
            .collect()
    }

    #[test]
    fn round_count_is_ceil_log2() {
        assert_eq!(round_count(1), 0);
        assert_eq!(round_count(2), 1);
        assert_eq!(round_count(3), 2);
        assert_eq!(round_count(4), 2);
        assert_eq!(round_count(5), 3);
        assert_eq!(round_count(8), 3);
        assert_eq!(round_count(9), 4);
    }

    #[test]
    fn empty_roster_is_rejected() {
        let mut rng = Rng::new(1);
        assert_eq!(build_brackets(&[], &mut rng), Err(TournamentError::EmptyRoster));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut fighters = roster(3);
        fighters[2].id = "f1".into();
        let mut rng = Rng::new(1);
        assert_eq!(
            build_brackets(&fighters, &mut rng),
            Err(TournamentError::DuplicateFighter("f1".into()))
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut fighters = roster(4);
        fighters[3].name = "Fighter 2".into();
        let mut rng = Rng::new(1);
        assert_eq!(
            build_brackets(&fighters, &mut rng),
            Err(TournamentError::DuplicateName("Fighter 2".into()))
        );
    }

    #[test]
    fn later_rounds_start_empty_and_pending() {
        let mut rng = Rng::new(4);
        let brackets = build_brackets(&roster(8), &mut rng).unwrap();
        assert_eq!(brackets.len(), 3);
        assert_eq!(brackets[1].matches.len(), 2);
        assert_eq!(brackets[2].matches.len(), 1);
        for bracket in &brackets[1..] {
            for m in &bracket.matches {
                assert_eq!(m.status, MatchStatus::Pending);
                assert_eq!(m.fighter_count(), 0);
            }
        }
    }

    #[test]
    fn every_fighter_is_seeded_exactly_once() {
        let mut rng = Rng::new(9);
        let fighters = roster(7);
        let brackets = build_brackets(&fighters, &mut rng).unwrap();
        let mut ids: Vec<&str> = brackets[0]
            .matches
            .iter()
            .flat_map(|m| [m.fighter_a.as_ref(), m.fighter_b.as_ref()])
            .flatten()
            .map(|f| f.id.as_str())
            .collect();
        ids.sort_unstable();
        let mut expected: Vec<&str> = fighters.iter().map(|f| f.id.as_str()).collect();
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }
}
