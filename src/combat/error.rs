use thiserror::Error;

/// Invalid input to the resolver. Raised before any roll is drawn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("max_rounds must be at least 1")]
    InvalidRoundLimit,

    #[error("fighter '{name}' has no health left")]
    NonPositiveHealth { name: String },

    #[error("fighter '{name}' has health {health} above max_health {max_health}")]
    HealthExceedsMax {
        name: String,
        health: u32,
        max_health: u32,
    },

    #[error("both fighters are named '{name}'; the verdict could not tell them apart")]
    SharedName { name: String },
}
