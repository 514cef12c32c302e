//! Orchestration: owns the mutable tournament, drives matches through the resolver,
//! and reports progress to subscribers over channels.
//!
//! The engine pieces stay pure. The runner is the only place that mutates brackets
//! and stats, and every mutation happens on the caller's thread. [TournamentRunner::play_round]
//! resolves a round's bouts in parallel, but each bout gets a seed drawn up front from the
//! runner's generator, so results do not depend on thread scheduling.

use std::sync::mpsc::{channel, Receiver, Sender};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::combat::{
    resolve_with_balance, validate_fighter, Arena, BalanceConfig, BattleLog, CombatError, Fighter,
    Rng, RollSource, Verdict,
};
use crate::parallel::WorkerPool;
use crate::tournament::advance::{
    advance, champion, is_complete, promote_lone_fighters, round_settled,
};
use crate::tournament::builder::build_brackets;
use crate::tournament::error::TournamentError;
use crate::tournament::model::{MatchStatus, Tournament, TournamentMatch, TournamentStatus};
use crate::tournament::stats::{init_stats, update_stats, NotableMoment, StatsTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentSettings {
    /// Round budget handed to the resolver for every bout.
    pub max_rounds: u32,
    /// Extra bouts fought after a draw before the tie-break applies.
    pub max_rematches: u32,
    /// Worker threads for [TournamentRunner::play_round]; 0 uses the Rayon default.
    pub workers: usize,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            max_rounds: 12,
            max_rematches: 3,
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TournamentEvent {
    MatchStarted {
        match_id: String,
        fighter_a: String,
        fighter_b: String,
        arena: String,
    },
    ByeAwarded {
        match_id: String,
        fighter: String,
    },
    MatchCompleted {
        match_id: String,
        winner: String,
        rounds: u32,
        rematches: u32,
        tiebreak: bool,
    },
    FighterEliminated {
        fighter_id: String,
        fighter: String,
        round: u32,
    },
    NotableMoment(NotableMoment),
    RoundAdvanced {
        round: u32,
    },
    TournamentCompleted {
        winner: String,
    },
}

/// What one played match produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub match_id: String,
    pub winner: Fighter,
    pub log: BattleLog,
    pub notable: Option<NotableMoment>,
    pub rematches: u32,
    pub tiebreak: bool,
}

/// Outcome of a contested bout, including rematches.
#[derive(Debug, Clone)]
struct Decision {
    log: BattleLog,
    winner_is_a: bool,
    rematches: u32,
    tiebreak: bool,
}

/// A ready match with everything needed to resolve it off the runner.
#[derive(Debug, Clone)]
struct PreparedBout {
    match_number: u32,
    fighter_a: Fighter,
    fighter_b: Fighter,
    arena: Arena,
    seed: u64,
}

pub struct TournamentRunner<R: RollSource> {
    tournament: Tournament,
    stats: StatsTable,
    arenas: Vec<Arena>,
    arena_usage: Vec<u32>,
    settings: TournamentSettings,
    balance: BalanceConfig,
    rolls: R,
    subscribers: Vec<Sender<TournamentEvent>>,
}

impl<R: RollSource> TournamentRunner<R> {
    pub fn new(
        fighters: &[Fighter],
        arenas: Vec<Arena>,
        settings: TournamentSettings,
        balance: BalanceConfig,
        mut rolls: R,
    ) -> Result<Self, TournamentError> {
        if settings.max_rounds == 0 {
            return Err(CombatError::InvalidRoundLimit.into());
        }
        for fighter in fighters {
            validate_fighter(fighter)?;
        }
        let brackets = build_brackets(fighters, &mut rolls)?;
        let mut tournament = Tournament::new(fighters.to_vec(), brackets);
        tournament.status = TournamentStatus::InProgress;
        info!(
            tournament = %tournament.id,
            fighters = fighters.len(),
            rounds = tournament.brackets.len(),
            "tournament created"
        );

        let arena_usage = vec![0; arenas.len()];
        let mut runner = Self {
            tournament,
            stats: init_stats(fighters),
            arenas,
            arena_usage,
            settings,
            balance,
            rolls,
            subscribers: Vec::new(),
        };
        let byes: Vec<TournamentMatch> = runner.tournament.brackets[0]
            .matches
            .iter()
            .filter(|m| m.is_bye())
            .cloned()
            .collect();
        for bye in &byes {
            if let Some(winner) = &bye.winner {
                advance(&mut runner.tournament.brackets, winner, bye);
            }
        }
        runner.sync();
        Ok(runner)
    }

    /// Receive every event emitted from now on. Dropped receivers are pruned on the next send.
    pub fn subscribe(&mut self) -> Receiver<TournamentEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn tournament(&self) -> &Tournament {
        &self.tournament
    }

    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    pub fn is_complete(&self) -> bool {
        self.tournament.status == TournamentStatus::Completed
    }

    pub fn into_parts(self) -> (Tournament, StatsTable) {
        (self.tournament, self.stats)
    }

    /// Play the first ready match of the current round. None once the tournament is over.
    pub fn play_next_match(&mut self) -> Result<Option<MatchReport>, TournamentError> {
        if self.is_complete() {
            return Ok(None);
        }
        let round = self.tournament.current_round;
        let Some(match_number) = self
            .tournament
            .bracket(round)
            .and_then(|b| b.matches.iter().find(|m| m.is_ready()))
            .map(|m| m.match_number)
        else {
            warn!(round, "no ready match in an unfinished round");
            return Ok(None);
        };

        let bout = self.prepare(round, match_number)?;
        let decision = match decide(&bout, &self.settings, &self.balance, &mut self.rolls) {
            Ok(decision) => decision,
            Err(err) => {
                self.release(round, &[bout]);
                return Err(err.into());
            }
        };
        let report = self.complete(round, bout.match_number, decision)?;
        self.sync();
        Ok(Some(report))
    }

    /// Play every ready match of the current round, resolving bouts in parallel.
    pub fn play_round(&mut self) -> Result<Vec<MatchReport>, TournamentError> {
        if self.is_complete() {
            return Ok(Vec::new());
        }
        let round = self.tournament.current_round;
        let ready: Vec<u32> = self
            .tournament
            .bracket(round)
            .map(|b| {
                b.matches
                    .iter()
                    .filter(|m| m.is_ready())
                    .map(|m| m.match_number)
                    .collect()
            })
            .unwrap_or_default();

        let mut bouts = Vec::with_capacity(ready.len());
        for match_number in ready {
            match self.prepare(round, match_number) {
                Ok(bout) => bouts.push(bout),
                Err(err) => {
                    self.release(round, &bouts);
                    return Err(err);
                }
            }
        }

        let settings = self.settings;
        let balance = self.balance;
        let decisions: Result<Vec<(u32, Decision)>, CombatError> =
            WorkerPool::with_workers(settings.workers).install(|| {
                bouts
                    .par_iter()
                    .map(|bout| {
                        let mut rng = Rng::new(bout.seed);
                        decide(bout, &settings, &balance, &mut rng).map(|d| (bout.match_number, d))
                    })
                    .collect()
            });
        // A failed bout leaves the whole round unplayed.
        let decisions = match decisions {
            Ok(decisions) => decisions,
            Err(err) => {
                self.release(round, &bouts);
                return Err(err.into());
            }
        };

        let mut reports = Vec::with_capacity(decisions.len());
        for (match_number, decision) in decisions {
            reports.push(self.complete(round, match_number, decision)?);
        }
        self.sync();
        Ok(reports)
    }

    /// Play until a champion is crowned. A round that can make no progress is an error.
    pub fn run_to_completion(&mut self) -> Result<&Tournament, TournamentError> {
        while !self.is_complete() {
            let round = self.tournament.current_round;
            let played = self.play_round()?;
            if played.is_empty() && !self.is_complete() && self.tournament.current_round == round {
                warn!(round, "bracket stalled with no playable matches");
                return Err(TournamentError::Stalled { round });
            }
        }
        Ok(&self.tournament)
    }

    /// Mark a ready match in progress, assign its arena and draw its seed.
    fn prepare(&mut self, round: u32, match_number: u32) -> Result<PreparedBout, TournamentError> {
        let arena = self.assign_arena();
        let seed = self.rolls.next_u64();
        let m = self.match_mut(round, match_number)?;
        let (Some(fighter_a), Some(fighter_b)) = (m.fighter_a.clone(), m.fighter_b.clone()) else {
            return Err(TournamentError::MissingFighter {
                match_id: m.id.clone(),
            });
        };
        m.status = MatchStatus::InProgress;
        m.arena = Some(arena.clone());
        let event = TournamentEvent::MatchStarted {
            match_id: m.id.clone(),
            fighter_a: fighter_a.name.clone(),
            fighter_b: fighter_b.name.clone(),
            arena: arena.name.clone(),
        };
        self.emit(event);
        Ok(PreparedBout {
            match_number,
            fighter_a,
            fighter_b,
            arena,
            seed,
        })
    }

    /// Put prepared matches back to pending after a bout failed to resolve.
    fn release(&mut self, round: u32, bouts: &[PreparedBout]) {
        for bout in bouts {
            if let Ok(m) = self.match_mut(round, bout.match_number) {
                m.status = MatchStatus::Pending;
                m.arena = None;
            }
        }
    }

    /// Record a decided bout, advance its winner and fold it into the stats.
    fn complete(
        &mut self,
        round: u32,
        match_number: u32,
        decision: Decision,
    ) -> Result<MatchReport, TournamentError> {
        let m = self.match_mut(round, match_number)?;
        let (winner, loser) = match (&m.fighter_a, &m.fighter_b) {
            (Some(a), Some(b)) if decision.winner_is_a => (a.clone(), b.clone()),
            (Some(a), Some(b)) => (b.clone(), a.clone()),
            _ => {
                return Err(TournamentError::MissingFighter {
                    match_id: m.id.clone(),
                })
            }
        };
        m.winner = Some(winner.clone());
        m.battle_log = Some(decision.log.clone());
        m.status = MatchStatus::Completed;
        let completed = m.clone();

        advance(&mut self.tournament.brackets, &winner, &completed);
        let notable = update_stats(&mut self.stats, &completed, &decision.log)?;

        self.emit(TournamentEvent::MatchCompleted {
            match_id: completed.id.clone(),
            winner: winner.name.clone(),
            rounds: decision.log.round_count(),
            rematches: decision.rematches,
            tiebreak: decision.tiebreak,
        });
        self.emit(TournamentEvent::FighterEliminated {
            fighter_id: loser.id.clone(),
            fighter: loser.name.clone(),
            round,
        });
        if let Some(moment) = &notable {
            self.tournament.notable_moments.push(moment.clone());
            self.emit(TournamentEvent::NotableMoment(moment.clone()));
        }
        info!(
            match_id = %completed.id,
            winner = %winner.name,
            rounds = decision.log.round_count(),
            "match completed"
        );

        Ok(MatchReport {
            match_id: completed.id,
            winner,
            log: decision.log,
            notable,
            rematches: decision.rematches,
            tiebreak: decision.tiebreak,
        })
    }

    /// Promote lone fighters, move the round pointer past finished rounds and crown a champion.
    fn sync(&mut self) {
        loop {
            if is_complete(&self.tournament.brackets) {
                self.finish();
                return;
            }
            let round = self.tournament.current_round;
            let promoted = promote_lone_fighters(&mut self.tournament.brackets, round);
            for bye in &promoted {
                if let Some(winner) = &bye.winner {
                    advance(&mut self.tournament.brackets, winner, bye);
                    self.emit(TournamentEvent::ByeAwarded {
                        match_id: bye.id.clone(),
                        fighter: winner.name.clone(),
                    });
                }
            }
            if !round_settled(&self.tournament.brackets, round)
                || self.tournament.bracket(round + 1).is_none()
            {
                return;
            }
            self.tournament.current_round = round + 1;
            debug!(round = round + 1, "round advanced");
            self.emit(TournamentEvent::RoundAdvanced { round: round + 1 });
        }
    }

    fn finish(&mut self) {
        if self.tournament.status == TournamentStatus::Completed {
            return;
        }
        let winner = champion(&self.tournament.brackets).cloned();
        self.tournament.status = TournamentStatus::Completed;
        self.tournament.winner = winner.clone();
        if let Some(winner) = winner {
            if let Some(entry) = self.stats.get_mut(&winner.id) {
                entry.journey_summary = format!(
                    "champion after {} win(s), {} damage dealt",
                    entry.wins, entry.total_damage_dealt
                );
            }
            info!(tournament = %self.tournament.id, champion = %winner.name, "tournament completed");
            self.emit(TournamentEvent::TournamentCompleted {
                winner: winner.name,
            });
        }
    }

    /// Weighted toward arenas used least so far.
    fn assign_arena(&mut self) -> Arena {
        let weighted: Vec<(usize, f64)> = self
            .arena_usage
            .iter()
            .enumerate()
            .map(|(idx, used)| (idx, 1.0 / f64::from(1 + used)))
            .collect();
        match self.rolls.weighted_pick(&weighted).copied() {
            Some(idx) => {
                self.arena_usage[idx] += 1;
                self.arenas[idx].clone()
            }
            None => Arena::default(),
        }
    }

    fn match_mut(
        &mut self,
        round: u32,
        match_number: u32,
    ) -> Result<&mut TournamentMatch, TournamentError> {
        self.tournament
            .brackets
            .iter_mut()
            .find(|b| b.round == round)
            .and_then(|b| b.find_match_mut(match_number))
            .ok_or_else(|| TournamentError::MissingFighter {
                match_id: TournamentMatch::match_id(round, match_number),
            })
    }

    fn emit(&mut self, event: TournamentEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Fight, rematching draws; after the rematch budget the healthier fighter (by fraction of
/// max health) takes it, and fighter A on an exact tie.
fn decide<R: RollSource>(
    bout: &PreparedBout,
    settings: &TournamentSettings,
    balance: &BalanceConfig,
    rolls: &mut R,
) -> Result<Decision, CombatError> {
    let mut rematches = 0;
    loop {
        let mut log = resolve_with_balance(
            &bout.fighter_a,
            &bout.fighter_b,
            &bout.arena,
            settings.max_rounds,
            balance,
            rolls,
        )?;
        if let Some(name) = log.winner.winner() {
            let winner_is_a = name == bout.fighter_a.name;
            return Ok(Decision {
                log,
                winner_is_a,
                rematches,
                tiebreak: false,
            });
        }
        if rematches < settings.max_rematches {
            rematches += 1;
            debug!(a = %bout.fighter_a.name, b = %bout.fighter_b.name, rematches, "draw; rematch");
            continue;
        }
        let winner_is_a = tiebreak_favors_a(&bout.fighter_a, &bout.fighter_b, &log);
        let winner = if winner_is_a {
            &bout.fighter_a
        } else {
            &bout.fighter_b
        };
        log.winner = Verdict::Winner(winner.name.clone());
        return Ok(Decision {
            log,
            winner_is_a,
            rematches,
            tiebreak: true,
        });
    }
}

fn tiebreak_favors_a(a: &Fighter, b: &Fighter, log: &BattleLog) -> bool {
    let fraction = |f: &Fighter| {
        let health = final_health(f, log);
        f64::from(health) / f64::from(f.stats.max_health.max(1))
    };
    fraction(a) >= fraction(b)
}

/// Health at the end of the log, or starting health if the fighter never appears.
fn final_health(fighter: &Fighter, log: &BattleLog) -> u32 {
    log.rounds
        .iter()
        .rev()
        .find_map(|r| {
            if r.attacker == fighter.name {
                Some(r.health_after.attacker)
            } else if r.defender == fighter.name {
                Some(r.health_after.defender)
            } else {
                None
            }
        })
        .unwrap_or(fighter.stats.health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Stats;

    fn roster(n: usize) -> Vec<Fighter> {
        (1..=n)
            .map(|i| {
                let mut stats = Stats::new(150 + 10 * i as u32, 18 + i as u32);
                stats.defense = 8;
                Fighter::new(format!("f{i}"), format!("Fighter {i}"), stats)
            })
            .collect()
    }

    fn runner(n: usize, seed: u64) -> TournamentRunner<Rng> {
        TournamentRunner::new(
            &roster(n),
            vec![Arena::new("Pit", ["brazier"]), Arena::new("Ring", ["ropes", "bell"])],
            TournamentSettings::default(),
            BalanceConfig::default(),
            Rng::new(seed),
        )
        .expect("runner should build")
    }

    #[test]
    fn single_fighter_is_crowned_immediately() {
        let r = runner(1, 3);
        assert!(r.is_complete());
        assert_eq!(r.tournament().winner.as_ref().map(|f| f.id.as_str()), Some("f1"));
    }

    #[test]
    fn five_fighters_play_four_matches() {
        let mut r = runner(5, 21);
        let mut played = 0;
        while let Some(report) = r.play_next_match().unwrap() {
            assert!(!report.log.winner.is_draw());
            played += 1;
        }
        assert!(r.is_complete());
        assert_eq!(played, 4);
        let eliminated = r.stats().values().filter(|s| s.eliminated).count();
        assert_eq!(eliminated, 4);
        let champion = r.tournament().winner.clone().expect("champion");
        assert!(!r.stats()[&champion.id].eliminated);
    }

    #[test]
    fn nine_fighters_leave_a_vacant_slot_and_still_finish() {
        let mut r = runner(9, 5);
        r.run_to_completion().unwrap();
        assert!(r.is_complete());
        let played = r
            .tournament()
            .brackets
            .iter()
            .flat_map(|b| b.matches.iter())
            .filter(|m| m.battle_log.is_some())
            .count();
        assert_eq!(played, 8);
        assert_eq!(r.stats().values().filter(|s| s.eliminated).count(), 8);
    }

    #[test]
    fn run_to_completion_emits_final_event() {
        let mut r = runner(6, 8);
        let rx = r.subscribe();
        r.run_to_completion().unwrap();
        let events: Vec<TournamentEvent> = rx.try_iter().collect();
        let completed = events
            .iter()
            .filter(|e| matches!(e, TournamentEvent::MatchCompleted { .. }))
            .count();
        assert_eq!(completed, 5);
        assert!(matches!(
            events.last(),
            Some(TournamentEvent::TournamentCompleted { .. })
        ));
    }

    #[test]
    fn same_seed_same_champion_regardless_of_workers() {
        let mut serial = TournamentRunner::new(
            &roster(8),
            Vec::new(),
            TournamentSettings {
                workers: 1,
                ..TournamentSettings::default()
            },
            BalanceConfig::default(),
            Rng::new(77),
        )
        .unwrap();
        let mut parallel = TournamentRunner::new(
            &roster(8),
            Vec::new(),
            TournamentSettings {
                workers: 4,
                ..TournamentSettings::default()
            },
            BalanceConfig::default(),
            Rng::new(77),
        )
        .unwrap();
        serial.run_to_completion().unwrap();
        parallel.run_to_completion().unwrap();
        assert_eq!(serial.tournament().brackets, parallel.tournament().brackets);
    }

    #[test]
    fn tiebreak_prefers_higher_health_fraction() {
        let a = Fighter::new("a", "A", Stats::new(100, 10));
        let b = Fighter::new("b", "B", Stats::new(200, 10));
        let log = BattleLog {
            winner: Verdict::Draw,
            rounds: Vec::new(),
        };
        assert!(tiebreak_favors_a(&a, &b, &log));
    }

    #[test]
    fn zero_round_budget_is_rejected() {
        let result = TournamentRunner::new(
            &roster(2),
            Vec::new(),
            TournamentSettings {
                max_rounds: 0,
                ..TournamentSettings::default()
            },
            BalanceConfig::default(),
            Rng::new(1),
        );
        assert!(matches!(
            result,
            Err(TournamentError::Combat(CombatError::InvalidRoundLimit))
        ));
    }

    fn build(fighters: &[Fighter]) -> Result<TournamentRunner<Rng>, TournamentError> {
        TournamentRunner::new(
            fighters,
            Vec::new(),
            TournamentSettings::default(),
            BalanceConfig::default(),
            Rng::new(1),
        )
    }

    #[test]
    fn runner_rejects_non_positive_health() {
        let mut fighters = roster(4);
        fighters[1].stats.health = 0;
        assert!(matches!(
            build(&fighters),
            Err(TournamentError::Combat(CombatError::NonPositiveHealth { name })) if name == "Fighter 2"
        ));
    }

    #[test]
    fn runner_rejects_health_above_max() {
        let mut fighters = roster(3);
        fighters[2].stats.health = fighters[2].stats.max_health + 1;
        assert!(matches!(
            build(&fighters),
            Err(TournamentError::Combat(CombatError::HealthExceedsMax { .. }))
        ));
    }

    #[test]
    fn runner_rejects_duplicate_names() {
        let mut fighters = roster(2);
        fighters[0].name = "Rex".into();
        fighters[1].name = "Rex".into();
        assert_eq!(
            build(&fighters).err(),
            Some(TournamentError::DuplicateName("Rex".into()))
        );
    }

    fn wound_first_match(r: &mut TournamentRunner<Rng>) {
        let m = &mut r.tournament.brackets[0].matches[0];
        if let Some(f) = m.fighter_b.as_mut() {
            f.stats.health = 0;
        }
    }

    fn round_one_statuses(r: &TournamentRunner<Rng>) -> Vec<MatchStatus> {
        r.tournament().brackets[0]
            .matches
            .iter()
            .map(|m| m.status)
            .collect()
    }

    #[test]
    fn failed_round_leaves_matches_pending() {
        let mut r = runner(4, 1);
        wound_first_match(&mut r);
        assert!(matches!(
            r.play_round(),
            Err(TournamentError::Combat(CombatError::NonPositiveHealth { .. }))
        ));
        assert_eq!(round_one_statuses(&r), vec![MatchStatus::Pending; 2]);
        assert!(r.tournament().brackets[0].matches.iter().all(|m| m.arena.is_none()));
        assert!(r.stats().values().all(|s| !s.eliminated));
    }

    #[test]
    fn failed_single_match_goes_back_to_pending() {
        let mut r = runner(4, 1);
        wound_first_match(&mut r);
        assert!(r.play_next_match().is_err());
        assert_eq!(round_one_statuses(&r), vec![MatchStatus::Pending; 2]);
    }

    #[test]
    fn stalled_round_is_an_error() {
        let mut r = runner(4, 2);
        r.tournament.brackets[0].matches[0].status = MatchStatus::InProgress;
        assert_eq!(
            r.run_to_completion().err(),
            Some(TournamentError::Stalled { round: 1 })
        );
        assert!(!r.is_complete());
    }
}
