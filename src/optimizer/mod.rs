//! Monte Carlo estimates built on repeated seeded resolutions.

pub mod odds;

pub use odds::{estimate_odds, estimate_odds_with_balance, MatchOdds};
