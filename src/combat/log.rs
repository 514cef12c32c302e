//! Battle log: the ordered round records plus the verdict, as handed to the
//! presentation and commentary layers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DRAW: &str = "Draw";

/// Something beyond a plain hit happened this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomEvent {
    CriticalHit,
    Dodge,
    EnvironmentalHit,
    UnderdogDodge,
    WeakSpotCritical,
    FailedDodge,
}

impl RandomEvent {
    pub const fn description(self) -> &'static str {
        match self {
            Self::CriticalHit => "critical hit",
            Self::Dodge => "dodge",
            Self::EnvironmentalHit => "uses the arena",
            Self::UnderdogDodge => "dodges and counters",
            Self::WeakSpotCritical => "finds a weak spot",
            Self::FailedDodge => "fails to dodge",
        }
    }
}

impl fmt::Display for RandomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsUsed {
    pub attacker_strength: u32,
    pub attacker_agility: u32,
    pub attacker_luck: u32,
    pub defender_defense: u32,
    pub defender_agility: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAfter {
    pub attacker: u32,
    pub defender: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub attacker: String,
    pub defender: String,
    pub damage: u32,
    pub stats_used: StatsUsed,
    pub health_after: HealthAfter,
    #[serde(default)]
    pub random_event: Option<RandomEvent>,
    #[serde(default)]
    pub arena_object_used: Option<String>,
}

/// Outcome of a bout. Serialized as the winner's name or the literal `"Draw"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verdict {
    Winner(String),
    Draw,
}

impl Verdict {
    pub fn winner(&self) -> Option<&str> {
        match self {
            Self::Winner(name) => Some(name),
            Self::Draw => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winner(name) => f.write_str(name),
            Self::Draw => f.write_str(DRAW),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == DRAW {
            Self::Draw
        } else {
            Self::Winner(raw)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLog {
    pub winner: Verdict,
    pub rounds: Vec<RoundRecord>,
}

impl BattleLog {
    pub fn round_count(&self) -> u32 {
        self.rounds.len() as u32
    }

    pub fn total_damage(&self) -> u64 {
        self.rounds.iter().map(|r| u64::from(r.damage)).sum()
    }

    /// Sum of damage dealt by `name` as attacker.
    pub fn damage_dealt_by(&self, name: &str) -> u64 {
        self.rounds
            .iter()
            .filter(|r| r.attacker == name)
            .map(|r| u64::from(r.damage))
            .sum()
    }

    /// Sum of damage taken by `name` as defender.
    pub fn damage_taken_by(&self, name: &str) -> u64 {
        self.rounds
            .iter()
            .filter(|r| r.defender == name)
            .map(|r| u64::from(r.damage))
            .sum()
    }
}

/// Serialize a battle log as pretty JSON for the presentation layer.
pub fn serialize_log_json(log: &BattleLog) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(log)
}
