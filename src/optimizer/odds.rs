use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::combat::{resolve_with_balance, Arena, BalanceConfig, CombatError, Fighter, Rng, Verdict};
use crate::parallel::{seed_batches, SeedBatch, WorkerPool};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOdds {
    pub fighter_a: String,
    pub fighter_b: String,
    pub iterations: usize,
    pub fighter_a_wins: usize,
    pub fighter_b_wins: usize,
    pub draws: usize,
    pub fighter_a_win_rate: f64,
    pub fighter_b_win_rate: f64,
    pub draw_rate: f64,
    pub average_rounds: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    a_wins: usize,
    b_wins: usize,
    draws: usize,
    rounds: u64,
}

impl Tally {
    fn merge(self, other: Self) -> Self {
        Self {
            a_wins: self.a_wins + other.a_wins,
            b_wins: self.b_wins + other.b_wins,
            draws: self.draws + other.draws,
            rounds: self.rounds + other.rounds,
        }
    }
}

/// Head-to-head Monte Carlo estimate under the default balance. Iteration `i` resolves with
/// seed `seed + i`, so the result depends only on the inputs, not on how batches land on threads.
pub fn estimate_odds(
    a: &Fighter,
    b: &Fighter,
    arena: &Arena,
    max_rounds: u32,
    iterations: usize,
    seed: u64,
    pool: &WorkerPool,
) -> Result<MatchOdds, CombatError> {
    estimate_odds_with_balance(
        a,
        b,
        arena,
        max_rounds,
        &BalanceConfig::default(),
        iterations,
        seed,
        pool,
    )
}

/// Like [estimate_odds] but with the balance the tournament runs under.
#[allow(clippy::too_many_arguments)]
pub fn estimate_odds_with_balance(
    a: &Fighter,
    b: &Fighter,
    arena: &Arena,
    max_rounds: u32,
    balance: &BalanceConfig,
    iterations: usize,
    seed: u64,
    pool: &WorkerPool,
) -> Result<MatchOdds, CombatError> {
    if max_rounds == 0 {
        return Err(CombatError::InvalidRoundLimit);
    }
    if a.name == b.name {
        return Err(CombatError::SharedName {
            name: a.name.clone(),
        });
    }

    let run_batch = |batch: SeedBatch| -> Result<Tally, CombatError> {
        let mut tally = Tally::default();
        for iteration_seed in batch.seeds() {
            let mut rng = Rng::new(iteration_seed);
            let log = resolve_with_balance(a, b, arena, max_rounds, balance, &mut rng)?;
            tally.rounds += u64::from(log.round_count());
            match log.winner {
                Verdict::Winner(name) if name == a.name => tally.a_wins += 1,
                Verdict::Winner(_) => tally.b_wins += 1,
                Verdict::Draw => tally.draws += 1,
            }
        }
        Ok(tally)
    };

    let tally = pool.install(|| {
        let batches = seed_batches(iterations, seed, rayon::current_num_threads());
        debug!(iterations, batches = batches.len(), "estimating odds");
        batches
            .into_par_iter()
            .map(run_batch)
            .try_reduce(Tally::default, |x, y| Ok(x.merge(y)))
    })?;

    let rate = |count: usize| {
        if iterations == 0 {
            0.0
        } else {
            count as f64 / iterations as f64
        }
    };
    Ok(MatchOdds {
        fighter_a: a.name.clone(),
        fighter_b: b.name.clone(),
        iterations,
        fighter_a_wins: tally.a_wins,
        fighter_b_wins: tally.b_wins,
        draws: tally.draws,
        fighter_a_win_rate: rate(tally.a_wins),
        fighter_b_win_rate: rate(tally.b_wins),
        draw_rate: rate(tally.draws),
        average_rounds: if iterations == 0 {
            0.0
        } else {
            tally.rounds as f64 / iterations as f64
        },
    })
}
