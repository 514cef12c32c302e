//! Tournament-wide fighter statistics and notable-moment classification.
//!
//! Stats are keyed by fighter id. Each played match updates both participants exactly
//! once; the loser is marked eliminated and rejects further updates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::{BattleLog, Build, Fighter, Verdict};
use crate::tournament::error::TournamentError;
use crate::tournament::model::TournamentMatch;

pub const DOMINANCE_MAX_ROUNDS: u32 = 3;
pub const DOMINANCE_MIN_DAMAGE: u64 = 200;
pub const DRAMA_MIN_ROUNDS: u32 = 10;
pub const SKILL_MIN_DAMAGE: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentKind {
    Dominance,
    Drama,
    Skill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotableMoment {
    pub match_id: String,
    pub kind: MomentKind,
    pub rounds: u32,
    pub total_damage: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterTournamentStats {
    pub fighter_id: String,
    pub fighter_name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub total_damage_dealt: u64,
    pub total_damage_taken: u64,
    pub average_damage_per_round: f64,
    #[serde(default)]
    pub fastest_win: Option<u32>,
    #[serde(default)]
    pub longest_battle: Option<u32>,
    pub eliminated: bool,
    #[serde(default)]
    pub fighting_style: String,
    #[serde(default)]
    pub journey_summary: String,
}

impl FighterTournamentStats {
    pub fn new(fighter: &Fighter) -> Self {
        Self {
            fighter_id: fighter.id.clone(),
            fighter_name: fighter.name.clone(),
            matches_played: 0,
            wins: 0,
            losses: 0,
            total_damage_dealt: 0,
            total_damage_taken: 0,
            average_damage_per_round: 0.0,
            fastest_win: None,
            longest_battle: None,
            eliminated: false,
            fighting_style: fighting_style(fighter.stats.build).to_string(),
            journey_summary: String::new(),
        }
    }

    fn record(&mut self, log: &BattleLog, won: bool) {
        let rounds = log.round_count();
        self.matches_played += 1;
        self.total_damage_dealt += log.damage_dealt_by(&self.fighter_name);
        self.total_damage_taken += log.damage_taken_by(&self.fighter_name);
        self.average_damage_per_round =
            self.total_damage_dealt as f64 / f64::from(self.matches_played);
        self.longest_battle = Some(self.longest_battle.map_or(rounds, |r| r.max(rounds)));
        if won {
            self.wins += 1;
            self.fastest_win = Some(self.fastest_win.map_or(rounds, |r| r.min(rounds)));
        } else {
            self.losses += 1;
            self.eliminated = true;
        }
    }
}

/// Label consumed by the narrative layer; derived from body build.
pub fn fighting_style(build: Build) -> &'static str {
    match build {
        Build::Thin => "evasive",
        Build::Average => "balanced",
        Build::Muscular => "aggressive",
        Build::Heavy => "tank",
    }
}

pub type StatsTable = BTreeMap<String, FighterTournamentStats>;

pub fn init_stats(fighters: &[Fighter]) -> StatsTable {
    fighters
        .iter()
        .map(|f| (f.id.clone(), FighterTournamentStats::new(f)))
        .collect()
}

/// Fold a played match into both fighters' stats. Byes carry no log and are never passed here.
/// Returns the match's notable moment, if any.
pub fn update_stats(
    stats: &mut StatsTable,
    played: &TournamentMatch,
    log: &BattleLog,
) -> Result<Option<NotableMoment>, TournamentError> {
    let (a, b) = match (&played.fighter_a, &played.fighter_b) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(TournamentError::MissingFighter {
                match_id: played.id.clone(),
            })
        }
    };
    if a.name == b.name {
        return Err(TournamentError::DuplicateName(a.name.clone()));
    }
    let winner_name = match &log.winner {
        Verdict::Winner(name) if *name == a.name || *name == b.name => name,
        _ => {
            return Err(TournamentError::UndecidedMatch {
                match_id: played.id.clone(),
            })
        }
    };
    let (winner, loser) = if *winner_name == a.name { (a, b) } else { (b, a) };

    let mut won = contender(stats, winner)?;
    let mut lost = contender(stats, loser)?;
    won.record(log, true);
    lost.record(log, false);
    stats.insert(winner.id.clone(), won);
    stats.insert(loser.id.clone(), lost);
    debug!(match_id = %played.id, winner = %winner.name, loser = %loser.name, "stats updated");

    Ok(classify_moment(&played.id, log))
}

/// Working copy of a fighter's entry; it must exist and still be in the running.
fn contender(
    stats: &StatsTable,
    fighter: &Fighter,
) -> Result<FighterTournamentStats, TournamentError> {
    match stats.get(&fighter.id) {
        None => Err(TournamentError::UnknownFighter(fighter.id.clone())),
        Some(entry) if entry.eliminated => {
            Err(TournamentError::FighterEliminated(fighter.id.clone()))
        }
        Some(entry) => Ok(entry.clone()),
    }
}

/// Dominance (short and brutal) is checked before drama (long) before skill (heavy damage).
pub fn classify_moment(match_id: &str, log: &BattleLog) -> Option<NotableMoment> {
    let rounds = log.round_count();
    let total_damage = log.total_damage();
    let kind = if rounds <= DOMINANCE_MAX_ROUNDS && total_damage > DOMINANCE_MIN_DAMAGE {
        MomentKind::Dominance
    } else if rounds >= DRAMA_MIN_ROUNDS {
        MomentKind::Drama
    } else if total_damage > SKILL_MIN_DAMAGE {
        MomentKind::Skill
    } else {
        return None;
    };
    Some(NotableMoment {
        match_id: match_id.to_string(),
        kind,
        rounds,
        total_damage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{HealthAfter, RoundRecord, Stats, StatsUsed};
    use crate::tournament::model::MatchStatus;

    fn fighter(id: &str, name: &str) -> Fighter {
        Fighter::new(id, name, Stats::new(300, 20))
    }

    fn log_with(rounds: &[(&str, &str, u32)], winner: &str) -> BattleLog {
        BattleLog {
            winner: Verdict::Winner(winner.to_string()),
            rounds: rounds
                .iter()
                .enumerate()
                .map(|(i, (att, def, dmg))| RoundRecord {
                    round: i as u32 + 1,
                    attacker: att.to_string(),
                    defender: def.to_string(),
                    damage: *dmg,
                    stats_used: StatsUsed {
                        attacker_strength: 20,
                        attacker_agility: 10,
                        attacker_luck: 10,
                        defender_defense: 10,
                        defender_agility: 10,
                    },
                    health_after: HealthAfter {
                        attacker: 100,
                        defender: 100,
                    },
                    random_event: None,
                    arena_object_used: None,
                })
                .collect(),
        }
    }

    fn played(a: &Fighter, b: &Fighter) -> TournamentMatch {
        TournamentMatch {
            fighter_a: Some(a.clone()),
            fighter_b: Some(b.clone()),
            winner: Some(a.clone()),
            status: MatchStatus::Completed,
            ..TournamentMatch::empty(1, 1)
        }
    }

    #[test]
    fn update_attributes_damage_by_role() {
        let a = fighter("a", "Ajax");
        let b = fighter("b", "Brutus");
        let mut stats = init_stats(&[a.clone(), b.clone()]);
        let log = log_with(
            &[("Ajax", "Brutus", 40), ("Brutus", "Ajax", 15), ("Ajax", "Brutus", 60)],
            "Ajax",
        );
        update_stats(&mut stats, &played(&a, &b), &log).unwrap();

        let ajax = &stats["a"];
        assert_eq!((ajax.matches_played, ajax.wins, ajax.losses), (1, 1, 0));
        assert_eq!(ajax.total_damage_dealt, 100);
        assert_eq!(ajax.total_damage_taken, 15);
        assert_eq!(ajax.average_damage_per_round, 100.0);
        assert_eq!(ajax.fastest_win, Some(3));
        assert!(!ajax.eliminated);

        let brutus = &stats["b"];
        assert_eq!((brutus.matches_played, brutus.wins, brutus.losses), (1, 0, 1));
        assert_eq!(brutus.total_damage_dealt, 15);
        assert_eq!(brutus.longest_battle, Some(3));
        assert!(brutus.eliminated);
    }

    #[test]
    fn eliminated_fighters_are_frozen() {
        let a = fighter("a", "Ajax");
        let b = fighter("b", "Brutus");
        let mut stats = init_stats(&[a.clone(), b.clone()]);
        let log = log_with(&[("Ajax", "Brutus", 40)], "Ajax");
        update_stats(&mut stats, &played(&a, &b), &log).unwrap();
        let before = stats.clone();
        assert_eq!(
            update_stats(&mut stats, &played(&a, &b), &log),
            Err(TournamentError::FighterEliminated("b".into()))
        );
        assert_eq!(stats, before);
    }

    #[test]
    fn draws_and_strangers_are_rejected() {
        let a = fighter("a", "Ajax");
        let b = fighter("b", "Brutus");
        let mut stats = init_stats(&[a.clone(), b.clone()]);
        let mut log = log_with(&[("Ajax", "Brutus", 40)], "Ajax");
        log.winner = Verdict::Draw;
        assert!(matches!(
            update_stats(&mut stats, &played(&a, &b), &log),
            Err(TournamentError::UndecidedMatch { .. })
        ));
        log.winner = Verdict::Winner("Nobody".into());
        assert!(matches!(
            update_stats(&mut stats, &played(&a, &b), &log),
            Err(TournamentError::UndecidedMatch { .. })
        ));
    }

    #[test]
    fn untracked_fighter_leaves_the_table_untouched() {
        let a = fighter("a", "Ajax");
        let b = fighter("b", "Brutus");
        let mut stats = init_stats(&[a.clone()]);
        let before = stats.clone();
        let log = log_with(&[("Ajax", "Brutus", 40)], "Ajax");
        assert_eq!(
            update_stats(&mut stats, &played(&a, &b), &log),
            Err(TournamentError::UnknownFighter("b".into()))
        );
        assert_eq!(stats, before);
    }

    #[test]
    fn same_named_fighters_cannot_be_told_apart() {
        let a = fighter("a", "Rex");
        let b = fighter("b", "Rex");
        let mut stats = init_stats(&[a.clone(), b.clone()]);
        let log = log_with(&[("Rex", "Rex", 40)], "Rex");
        assert_eq!(
            update_stats(&mut stats, &played(&a, &b), &log),
            Err(TournamentError::DuplicateName("Rex".into()))
        );
        assert!(stats.values().all(|s| s.matches_played == 0));
    }

    #[test]
    fn moment_taxonomy_order() {
        let short_heavy = log_with(&[("A", "B", 150), ("B", "A", 100)], "A");
        assert_eq!(classify_moment("m", &short_heavy).map(|m| m.kind), Some(MomentKind::Dominance));

        let long_light: Vec<(&str, &str, u32)> = (0..12).map(|_| ("A", "B", 1)).collect();
        let long = log_with(&long_light, "A");
        assert_eq!(classify_moment("m", &long).map(|m| m.kind), Some(MomentKind::Drama));

        let mid_heavy: Vec<(&str, &str, u32)> = (0..5).map(|_| ("A", "B", 70)).collect();
        let skill = log_with(&mid_heavy, "A");
        assert_eq!(classify_moment("m", &skill).map(|m| m.kind), Some(MomentKind::Skill));

        let quiet = log_with(&[("A", "B", 10)], "A");
        assert!(classify_moment("m", &quiet).is_none());
    }

    #[test]
    fn fighting_style_follows_build() {
        let mut f = fighter("a", "Ajax");
        f.stats.build = Build::Heavy;
        assert_eq!(FighterTournamentStats::new(&f).fighting_style, "tank");
    }
}
