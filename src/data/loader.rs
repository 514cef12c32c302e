//! Load and save rosters, arenas, tournaments and battle logs.
//! Rosters and arena lists accept either a bare JSON array or `{ "fighters": [...] }` /
//! `{ "arenas": [...] }`.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combat::{write_rounds_csv, Arena, BattleLog, Fighter};
use crate::data::error::{DataError, Result};
use crate::tournament::Tournament;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub fighters: Vec<Fighter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArenaList {
    #[serde(default)]
    pub arenas: Vec<Arena>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListFile<W, T> {
    Wrapped(W),
    Bare(Vec<T>),
}

/// Normalize a string for lookup: lowercase, collapse spaces/underscores.
fn normalize_lookup(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|err| DataError::io(path, err))?;
    serde_json::from_str(&raw).map_err(|err| DataError::json(path, err))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value).map_err(|err| DataError::json(path, err))?;
    fs::write(path, raw).map_err(|err| DataError::io(path, err))
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<Fighter>> {
    let path = path.as_ref();
    let fighters = match read_json::<ListFile<Roster, Fighter>>(path)? {
        ListFile::Wrapped(roster) => roster.fighters,
        ListFile::Bare(fighters) => fighters,
    };
    debug!(path = %path.display(), fighters = fighters.len(), "roster loaded");
    Ok(fighters)
}

pub fn save_roster(path: impl AsRef<Path>, fighters: &[Fighter]) -> Result<()> {
    write_json(
        path.as_ref(),
        &Roster {
            fighters: fighters.to_vec(),
        },
    )
}

pub fn load_arenas(path: impl AsRef<Path>) -> Result<Vec<Arena>> {
    let path = path.as_ref();
    let arenas = match read_json::<ListFile<ArenaList, Arena>>(path)? {
        ListFile::Wrapped(list) => list.arenas,
        ListFile::Bare(arenas) => arenas,
    };
    debug!(path = %path.display(), arenas = arenas.len(), "arenas loaded");
    Ok(arenas)
}

pub fn load_tournament(path: impl AsRef<Path>) -> Result<Tournament> {
    read_json(path.as_ref())
}

pub fn save_tournament(path: impl AsRef<Path>, tournament: &Tournament) -> Result<()> {
    write_json(path.as_ref(), tournament)
}

pub fn save_battle_log(path: impl AsRef<Path>, log: &BattleLog) -> Result<()> {
    write_json(path.as_ref(), log)
}

/// Write one CSV row per round.
pub fn export_rounds_csv(path: impl AsRef<Path>, log: &BattleLog) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(|err| DataError::io(path, err))?;
    write_rounds_csv(log, file)?;
    Ok(())
}

/// Find a fighter by id or by name, ignoring case and treating spaces and underscores alike.
pub fn find_fighter<'a>(fighters: &'a [Fighter], id_or_name: &str) -> Option<&'a Fighter> {
    if let Some(found) = fighters.iter().find(|f| f.id == id_or_name) {
        return Some(found);
    }
    let normalized = normalize_lookup(id_or_name);
    fighters
        .iter()
        .find(|f| normalize_lookup(&f.id) == normalized || normalize_lookup(&f.name) == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Stats;

    fn fighters() -> Vec<Fighter> {
        vec![
            Fighter::new("f1", "Iron Maw", Stats::new(120, 20)),
            Fighter::new("f2", "Swift Reed", Stats::new(90, 14)),
        ]
    }

    #[test]
    fn roster_round_trips_through_wrapped_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        save_roster(&path, &fighters()).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"fighters\""));
        assert_eq!(load_roster(&path).unwrap(), fighters());
    }

    #[test]
    fn bare_array_roster_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.json");
        fs::write(&path, serde_json::to_string(&fighters()).unwrap()).unwrap();
        assert_eq!(load_roster(&path).unwrap().len(), 2);
    }

    #[test]
    fn arenas_accept_both_forms() {
        let dir = tempfile::tempdir().unwrap();
        let wrapped = dir.path().join("wrapped.json");
        fs::write(
            &wrapped,
            r#"{"arenas":[{"name":"Pit","image":"","environmental_objects":["spikes"]}]}"#,
        )
        .unwrap();
        let arenas = load_arenas(&wrapped).unwrap();
        assert_eq!(arenas[0].environmental_objects, vec!["spikes".to_string()]);

        let bare = dir.path().join("bare.json");
        fs::write(&bare, r#"[{"name":"Ring","image":"","environmental_objects":[]}]"#).unwrap();
        assert_eq!(load_arenas(&bare).unwrap()[0].name, "Ring");
    }

    #[test]
    fn missing_and_malformed_files_are_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_roster(dir.path().join("nope.json")),
            Err(DataError::Io { .. })
        ));
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(load_roster(&bad), Err(DataError::Json { .. })));
    }

    #[test]
    fn lookup_by_id_or_loose_name() {
        let roster = fighters();
        assert_eq!(find_fighter(&roster, "f2").map(|f| f.name.as_str()), Some("Swift Reed"));
        assert_eq!(find_fighter(&roster, "iron_maw").map(|f| f.id.as_str()), Some("f1"));
        assert!(find_fighter(&roster, "ghost").is_none());
    }
}
