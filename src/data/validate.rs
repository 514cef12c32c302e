use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::combat::{Arena, BalanceConfig, Fighter};
use crate::data::error::Result;
use crate::data::loader::load_roster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Check a roster before it reaches the bracket builder or the resolver.
/// Battle logs name fighters, so names must be unique as well as ids.
pub fn validate_roster(fighters: &[Fighter]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if fighters.is_empty() {
        report.push(ValidationSeverity::Error, "roster", "roster has no fighters");
        return report;
    }

    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    for (index, fighter) in fighters.iter().enumerate() {
        let context = format!("fighters[{index}] id='{}'", fighter.id);
        if fighter.id.trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "missing non-empty 'id'");
        } else if !seen_ids.insert(fighter.id.as_str()) {
            report.push(
                ValidationSeverity::Error,
                &context,
                format!("duplicate id '{}'", fighter.id),
            );
        }
        if fighter.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "missing non-empty 'name'");
        } else if !seen_names.insert(fighter.name.as_str()) {
            report.push(
                ValidationSeverity::Error,
                &context,
                format!("duplicate name '{}'", fighter.name),
            );
        }

        let stats = &fighter.stats;
        if stats.health == 0 {
            report.push(ValidationSeverity::Error, format!("{context}.health"), "health must be positive");
        }
        if stats.health > stats.max_health {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.health"),
                format!("health {} exceeds max_health {}", stats.health, stats.max_health),
            );
        }
        if stats.strength == 0 {
            report.push(
                ValidationSeverity::Warning,
                format!("{context}.strength"),
                "zero strength deals no damage outside critical and environmental events",
            );
        }
        if stats.power() == 0 {
            report.push(
                ValidationSeverity::Warning,
                &context,
                "zero combined power; every bout against this fighter is an underdog bout",
            );
        }
    }

    report_underdog_pairs(&mut report, fighters);
    report
}

/// Informational: how many possible pairings would fight under the underdog rules.
fn report_underdog_pairs(report: &mut ValidationReport, fighters: &[Fighter]) {
    let ratio = BalanceConfig::default().underdog_power_ratio;
    let mut lopsided = 0usize;
    for (i, a) in fighters.iter().enumerate() {
        for b in &fighters[i + 1..] {
            let (pa, pb) = (a.stats.power() as f64, b.stats.power() as f64);
            let (hi, lo) = if pa >= pb { (pa, pb) } else { (pb, pa) };
            if lo == 0.0 || hi / lo >= ratio {
                lopsided += 1;
            }
        }
    }
    if lopsided > 0 {
        report.push(
            ValidationSeverity::Info,
            "roster",
            format!("{lopsided} pairing(s) would resolve in underdog mode"),
        );
    }
}

pub fn validate_arenas(arenas: &[Arena]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen = HashSet::new();
    for (index, arena) in arenas.iter().enumerate() {
        let context = format!("arenas[{index}] name='{}'", arena.name);
        if arena.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "missing non-empty 'name'");
        } else if !seen.insert(arena.name.as_str()) {
            report.push(
                ValidationSeverity::Warning,
                &context,
                format!("duplicate arena name '{}'", arena.name),
            );
        }
        if arena.environmental_objects.is_empty() {
            report.push(
                ValidationSeverity::Info,
                &context,
                "no environmental objects; environmental hits cannot occur here",
            );
        }
    }
    report
}

pub fn validate_roster_file(path: impl AsRef<Path>) -> Result<ValidationReport> {
    Ok(validate_roster(&load_roster(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Stats;

    fn fighter(id: &str, name: &str, health: u32) -> Fighter {
        Fighter::new(id, name, Stats::new(health, 15))
    }

    #[test]
    fn clean_roster_has_no_errors() {
        let report = validate_roster(&[fighter("a", "Ajax", 100), fighter("b", "Brutus", 110)]);
        assert!(!report.has_errors());
    }

    #[test]
    fn empty_roster_is_an_error() {
        assert!(validate_roster(&[]).has_errors());
    }

    #[test]
    fn duplicates_and_bad_health_are_errors() {
        let mut over = fighter("c", "Cato", 50);
        over.stats.max_health = 40;
        let report = validate_roster(&[
            fighter("a", "Ajax", 100),
            fighter("a", "Ajax", 100),
            fighter("z", "Zeno", 0),
            over,
        ]);
        assert_eq!(report.count(ValidationSeverity::Error), 4);
        let rendered: Vec<String> = report.diagnostics.iter().map(|d| d.to_string()).collect();
        assert!(rendered.iter().any(|line| line.contains("duplicate id 'a'")));
        assert!(rendered.iter().any(|line| line.contains("exceeds max_health")));
    }

    #[test]
    fn lopsided_pairings_are_reported_as_info() {
        let mut giant = fighter("g", "Goliath", 500);
        giant.stats.strength = 90;
        let report = validate_roster(&[giant, fighter("d", "David", 60)]);
        assert!(!report.has_errors());
        assert_eq!(report.count(ValidationSeverity::Info), 1);
    }

    #[test]
    fn arenas_without_objects_are_noted() {
        let report = validate_arenas(&[Arena::new("Pit", ["spikes"]), Arena::new("Sand", Vec::<String>::new())]);
        assert_eq!(report.count(ValidationSeverity::Info), 1);
        assert!(!report.has_errors());
    }
}
