//! Engine configuration: balance constants plus tournament settings, read from YAML.
//!
//! Every field has a default, so a config file only needs the values it overrides.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::BalanceConfig;
use crate::data::error::{DataError, Result};
use crate::tournament::TournamentSettings;

pub const DEFAULT_CONFIG_PATH: &str = "data/colosseum.yaml";
pub const CONFIG_PATH_ENV: &str = "COLOSSEUM_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub balance: BalanceConfig,
    pub tournament: TournamentSettings,
}

/// Config path from `COLOSSEUM_CONFIG`, falling back to [DEFAULT_CONFIG_PATH].
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the engine config. A missing file yields defaults; an unreadable or malformed one is an error.
pub fn load_engine_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no engine config; using defaults");
            return Ok(EngineConfig::default());
        }
        Err(err) => return Err(DataError::io(path, err)),
    };
    if raw.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    let config: EngineConfig = serde_yaml::from_str(&raw).map_err(|source| DataError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "engine config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_engine_config(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tournament.max_rounds, 12);
        assert_eq!(config.tournament.max_rematches, 3);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "balance:\n  critical_chance: 0.25\ntournament:\n  max_rounds: 20\n"
        )
        .unwrap();
        let config = load_engine_config(file.path()).unwrap();
        assert_eq!(config.balance.critical_chance, 0.25);
        assert_eq!(config.balance.dodge_trigger_chance, BalanceConfig::default().dodge_trigger_chance);
        assert_eq!(config.tournament.max_rounds, 20);
        assert_eq!(config.tournament.max_rematches, 3);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tournament: [not, a, map").unwrap();
        assert!(matches!(
            load_engine_config(file.path()),
            Err(DataError::Yaml { .. })
        ));
    }
}
