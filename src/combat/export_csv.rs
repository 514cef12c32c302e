//! Flatten a battle log into CSV rows (one per round) for spreadsheets and replay tooling.
//!
//! Columns: round, attacker, defender, damage, the five consulted stats,
//! both post-round health values, random_event, arena_object_used.

use std::io;

use serde::Serialize;

use crate::combat::log::{BattleLog, RoundRecord};

#[derive(Debug, Serialize)]
struct RoundRow<'a> {
    round: u32,
    attacker: &'a str,
    defender: &'a str,
    damage: u32,
    attacker_strength: u32,
    attacker_agility: u32,
    attacker_luck: u32,
    defender_defense: u32,
    defender_agility: u32,
    attacker_health_after: u32,
    defender_health_after: u32,
    random_event: &'a str,
    arena_object_used: &'a str,
}

impl<'a> From<&'a RoundRecord> for RoundRow<'a> {
    fn from(record: &'a RoundRecord) -> Self {
        Self {
            round: record.round,
            attacker: &record.attacker,
            defender: &record.defender,
            damage: record.damage,
            attacker_strength: record.stats_used.attacker_strength,
            attacker_agility: record.stats_used.attacker_agility,
            attacker_luck: record.stats_used.attacker_luck,
            defender_defense: record.stats_used.defender_defense,
            defender_agility: record.stats_used.defender_agility,
            attacker_health_after: record.health_after.attacker,
            defender_health_after: record.health_after.defender,
            random_event: record.random_event.map_or("", |e| e.description()),
            arena_object_used: record.arena_object_used.as_deref().unwrap_or(""),
        }
    }
}

pub fn write_rounds_csv<W: io::Write>(log: &BattleLog, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for record in &log.rounds {
        out.serialize(RoundRow::from(record))?;
    }
    out.flush()?;
    Ok(())
}

pub fn rounds_to_csv_string(log: &BattleLog) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_rounds_csv(log, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
