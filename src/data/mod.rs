pub mod config;
pub mod error;
pub mod loader;
pub mod validate;

pub use config::{config_path, load_engine_config, EngineConfig};
pub use error::DataError;
pub use loader::{
    export_rounds_csv, find_fighter, load_arenas, load_roster, load_tournament, save_battle_log,
    save_roster, save_tournament,
};
pub use validate::{
    validate_arenas, validate_roster, validate_roster_file, ValidationDiagnostic,
    ValidationReport, ValidationSeverity,
};
