//! Tunable constants for the resolver. Defaults reproduce the reference balancing;
//! the asymmetric underdog rules are knobs here rather than fixed laws of the simulation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Underdog mode starts when `max(power) / min(power)` reaches this ratio.
    pub underdog_power_ratio: f64,
    /// Underdog dodge chance is `(agility + luck) / underdog_dodge_divisor`.
    pub underdog_dodge_divisor: f64,
    /// Fraction of strength dealt after a successful underdog dodge.
    pub underdog_counter_factor: f64,
    pub weak_spot_chance: f64,
    /// Weak-spot damage as a fraction of the favorite's current health.
    pub weak_spot_health_factor: f64,
    pub favorite_variance: (f64, f64),
    pub favorite_environment_chance: f64,
    pub favorite_environment_multiplier: f64,
    pub balanced_variance: (f64, f64),
    /// Fraction of the defender's defense subtracted from a balanced hit.
    pub defense_factor: f64,
    pub min_balanced_damage: f64,
    pub critical_chance: f64,
    pub critical_multiplier: f64,
    pub dodge_trigger_chance: f64,
    /// Dodge success chance is `agility / dodge_agility_divisor`.
    pub dodge_agility_divisor: f64,
    pub environment_chance: f64,
    pub environment_multiplier: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            underdog_power_ratio: 2.0,
            underdog_dodge_divisor: 40.0,
            underdog_counter_factor: 0.5,
            weak_spot_chance: 0.10,
            weak_spot_health_factor: 0.8,
            favorite_variance: (0.8, 1.2),
            favorite_environment_chance: 0.20,
            favorite_environment_multiplier: 1.5,
            balanced_variance: (0.6, 1.4),
            defense_factor: 0.3,
            min_balanced_damage: 1.0,
            critical_chance: 0.15,
            critical_multiplier: 1.5,
            dodge_trigger_chance: 0.10,
            dodge_agility_divisor: 20.0,
            environment_chance: 0.10,
            environment_multiplier: 1.3,
        }
    }
}
