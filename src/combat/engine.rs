//! Round-by-round combat resolution.
//!
//! A bout alternates strictly: fighter A attacks on odd rounds, fighter B on even rounds.
//! Only the defender loses health in a round. When one fighter's power (`strength × health`)
//! is at least [BalanceConfig::underdog_power_ratio] times the other's, the bout runs in
//! underdog mode: the weaker side must dodge every exchange it initiates.

use tracing::{debug, trace};

use crate::combat::balance::BalanceConfig;
use crate::combat::error::CombatError;
use crate::combat::fighter::{Arena, Fighter};
use crate::combat::log::{BattleLog, HealthAfter, RandomEvent, RoundRecord, StatsUsed, Verdict};
use crate::combat::rng::RollSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Fighter A opens on odd rounds.
    const fn attacker_for_round(round: u32) -> Self {
        if round % 2 == 1 {
            Self::A
        } else {
            Self::B
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatMode {
    Balanced,
    Underdog { favorite: Side },
}

/// Outcome of a single exchange before it is applied.
#[derive(Debug, Clone, PartialEq)]
struct Strike {
    damage: u32,
    event: Option<RandomEvent>,
    object: Option<String>,
}

impl Strike {
    fn plain(damage: f64) -> Self {
        Self {
            damage: to_damage(damage),
            event: None,
            object: None,
        }
    }

    fn with_event(damage: f64, event: RandomEvent) -> Self {
        Self {
            damage: to_damage(damage),
            event: Some(event),
            object: None,
        }
    }
}

fn to_damage(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Resolve a bout with the default balance constants.
pub fn resolve<R: RollSource>(
    fighter_a: &Fighter,
    fighter_b: &Fighter,
    arena: &Arena,
    max_rounds: u32,
    rolls: &mut R,
) -> Result<BattleLog, CombatError> {
    resolve_with_balance(
        fighter_a,
        fighter_b,
        arena,
        max_rounds,
        &BalanceConfig::default(),
        rolls,
    )
}

pub fn resolve_with_balance<R: RollSource>(
    fighter_a: &Fighter,
    fighter_b: &Fighter,
    arena: &Arena,
    max_rounds: u32,
    balance: &BalanceConfig,
    rolls: &mut R,
) -> Result<BattleLog, CombatError> {
    validate_inputs(fighter_a, fighter_b, max_rounds)?;

    let fighters = [fighter_a, fighter_b];
    let mut health = [fighter_a.stats.health, fighter_b.stats.health];
    let mode = combat_mode(fighter_a, fighter_b, balance);
    debug!(
        a = %fighter_a.name,
        b = %fighter_b.name,
        arena = %arena.name,
        ?mode,
        max_rounds,
        "resolving bout"
    );

    let mut rounds = Vec::with_capacity(max_rounds as usize);
    for round in 1..=max_rounds {
        if health[0] == 0 || health[1] == 0 {
            break;
        }
        let attacker_side = Side::attacker_for_round(round);
        let defender_side = attacker_side.other();
        let attacker = fighters[attacker_side.index()];
        let defender = fighters[defender_side.index()];
        let defender_health = health[defender_side.index()];

        let strike = match mode {
            CombatMode::Balanced => balanced_strike(attacker, defender, arena, balance, rolls),
            CombatMode::Underdog { favorite } if favorite == attacker_side => {
                favorite_strike(attacker, arena, balance, rolls)
            }
            CombatMode::Underdog { .. } => {
                underdog_strike(attacker, defender_health, balance, rolls)
            }
        };

        let remaining = defender_health.saturating_sub(strike.damage);
        health[defender_side.index()] = remaining;
        trace!(
            round,
            attacker = %attacker.name,
            damage = strike.damage,
            event = ?strike.event,
            defender_health = remaining,
            "round resolved"
        );

        rounds.push(RoundRecord {
            round,
            attacker: attacker.name.clone(),
            defender: defender.name.clone(),
            damage: strike.damage,
            stats_used: StatsUsed {
                attacker_strength: attacker.stats.strength,
                attacker_agility: attacker.stats.agility,
                attacker_luck: attacker.stats.luck,
                defender_defense: defender.stats.defense,
                defender_agility: defender.stats.agility,
            },
            health_after: HealthAfter {
                attacker: health[attacker_side.index()],
                defender: remaining,
            },
            random_event: strike.event,
            arena_object_used: strike.object,
        });

        if remaining == 0 {
            break;
        }
    }

    let winner = verdict(fighters, health);
    debug!(winner = %winner, rounds = rounds.len(), "bout finished");
    Ok(BattleLog { winner, rounds })
}

fn validate_inputs(a: &Fighter, b: &Fighter, max_rounds: u32) -> Result<(), CombatError> {
    if max_rounds == 0 {
        return Err(CombatError::InvalidRoundLimit);
    }
    validate_fighter(a)?;
    validate_fighter(b)?;
    if a.name == b.name {
        return Err(CombatError::SharedName {
            name: a.name.clone(),
        });
    }
    Ok(())
}

/// A fighter can enter a bout only with `0 < health <= max_health`.
pub fn validate_fighter(fighter: &Fighter) -> Result<(), CombatError> {
    if fighter.stats.health == 0 {
        return Err(CombatError::NonPositiveHealth {
            name: fighter.name.clone(),
        });
    }
    if fighter.stats.health > fighter.stats.max_health {
        return Err(CombatError::HealthExceedsMax {
            name: fighter.name.clone(),
            health: fighter.stats.health,
            max_health: fighter.stats.max_health,
        });
    }
    Ok(())
}

/// Decide the bout's mode from the fighters' starting power.
pub fn combat_mode(a: &Fighter, b: &Fighter, balance: &BalanceConfig) -> CombatMode {
    let power_a = a.stats.power();
    let power_b = b.stats.power();
    let (strong, weak, favorite) = if power_a >= power_b {
        (power_a, power_b, Side::A)
    } else {
        (power_b, power_a, Side::B)
    };
    if strong > 0 && strong as f64 >= balance.underdog_power_ratio * weak as f64 {
        CombatMode::Underdog { favorite }
    } else {
        CombatMode::Balanced
    }
}

/// Underdog initiates: dodge into a counter, or go down trying.
fn underdog_strike<R: RollSource>(
    attacker: &Fighter,
    favorite_health: u32,
    balance: &BalanceConfig,
    rolls: &mut R,
) -> Strike {
    let stats = &attacker.stats;
    let dodge_chance =
        (f64::from(stats.agility) + f64::from(stats.luck)) / balance.underdog_dodge_divisor;
    if rolls.chance(dodge_chance) {
        if rolls.chance(balance.weak_spot_chance) {
            Strike::with_event(
                balance.weak_spot_health_factor * f64::from(favorite_health),
                RandomEvent::WeakSpotCritical,
            )
        } else {
            Strike::with_event(
                balance.underdog_counter_factor * f64::from(stats.strength),
                RandomEvent::UnderdogDodge,
            )
        }
    } else {
        Strike {
            damage: favorite_health,
            event: Some(RandomEvent::FailedDodge),
            object: None,
        }
    }
}

fn favorite_strike<R: RollSource>(
    attacker: &Fighter,
    arena: &Arena,
    balance: &BalanceConfig,
    rolls: &mut R,
) -> Strike {
    let (lo, hi) = balance.favorite_variance;
    let damage = f64::from(attacker.stats.strength) * rolls.uniform(lo, hi);
    if !arena.environmental_objects.is_empty() && rolls.chance(balance.favorite_environment_chance)
    {
        return environmental_strike(
            damage * balance.favorite_environment_multiplier,
            arena,
            rolls,
        );
    }
    Strike::plain(damage)
}

/// Critical, then dodge, then environment: only the first check that triggers applies.
fn balanced_strike<R: RollSource>(
    attacker: &Fighter,
    defender: &Fighter,
    arena: &Arena,
    balance: &BalanceConfig,
    rolls: &mut R,
) -> Strike {
    let (lo, hi) = balance.balanced_variance;
    let base = (f64::from(attacker.stats.strength) * rolls.uniform(lo, hi)
        - balance.defense_factor * f64::from(defender.stats.defense))
    .max(balance.min_balanced_damage);

    if rolls.chance(balance.critical_chance) {
        return Strike::with_event(base * balance.critical_multiplier, RandomEvent::CriticalHit);
    }
    if rolls.chance(balance.dodge_trigger_chance) {
        let evade = f64::from(defender.stats.agility) / balance.dodge_agility_divisor;
        if rolls.chance(evade) {
            return Strike::with_event(0.0, RandomEvent::Dodge);
        }
        return Strike::plain(base);
    }
    if !arena.environmental_objects.is_empty() && rolls.chance(balance.environment_chance) {
        return environmental_strike(base * balance.environment_multiplier, arena, rolls);
    }
    Strike::plain(base)
}

fn environmental_strike<R: RollSource>(damage: f64, arena: &Arena, rolls: &mut R) -> Strike {
    Strike {
        damage: to_damage(damage),
        event: Some(RandomEvent::EnvironmentalHit),
        object: rolls.pick(&arena.environmental_objects).cloned(),
    }
}

fn verdict(fighters: [&Fighter; 2], health: [u32; 2]) -> Verdict {
    match (health[0] == 0, health[1] == 0) {
        (true, true) => Verdict::Draw,
        (true, false) => Verdict::Winner(fighters[1].name.clone()),
        (false, true) => Verdict::Winner(fighters[0].name.clone()),
        (false, false) => match health[0].cmp(&health[1]) {
            std::cmp::Ordering::Greater => Verdict::Winner(fighters[0].name.clone()),
            std::cmp::Ordering::Less => Verdict::Winner(fighters[1].name.clone()),
            std::cmp::Ordering::Equal => Verdict::Draw,
        },
    }
}
