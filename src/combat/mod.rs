pub mod balance;
pub mod engine;
pub mod error;
pub mod export_csv;
pub mod fighter;
pub mod log;
pub mod rng;

pub use balance::BalanceConfig;
pub use engine::{
    combat_mode, resolve, resolve_with_balance, validate_fighter, CombatMode, Side,
};
pub use error::CombatError;
pub use export_csv::{rounds_to_csv_string, write_rounds_csv};
pub use fighter::{Arena, Build, Fighter, Size, Stats};
pub use log::{
    serialize_log_json, BattleLog, HealthAfter, RandomEvent, RoundRecord, StatsUsed, Verdict,
    DRAW,
};
pub use rng::{entropy_seed, RollSource, Rng, ScriptedRolls};
