use std::fmt::Write as _;

use tracing::{debug, error, info};

use crate::combat::{
    entropy_seed, resolve_with_balance, rounds_to_csv_string, Arena, BattleLog, Build, Fighter, Rng,
    Size, Stats,
};
use crate::data::{
    config_path, find_fighter, load_arenas, load_engine_config, load_roster, validate_arenas,
    validate_roster_file, EngineConfig, ValidationSeverity,
};
use crate::optimizer::estimate_odds_with_balance;
use crate::parallel::WorkerPool;
use crate::tournament::TournamentRunner;

const USAGE: &str = "usage: colosseum <simulate|tournament|odds|validate>";
const DEFAULT_SEED: u64 = 7;
const DEFAULT_ODDS_ITERATIONS: usize = 1000;

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--arenas"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Simulate,
    Tournament,
    Odds,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("simulate") => Some(Command::Simulate),
        Some("tournament") => Some(Command::Tournament),
        Some("odds") => Some(Command::Odds),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };
    let config = match load_engine_config(config_path()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    debug!(?command, "dispatching");
    match command {
        Command::Simulate => handle_simulate(args, &config),
        Command::Tournament => handle_tournament(args, &config),
        Command::Odds => handle_odds(args, &config),
        Command::Validate => handle_validate(args),
    }
}

fn handle_simulate(args: &[String], config: &EngineConfig) -> i32 {
    let positional = positional_args(args);
    let rounds = parse_u32_arg(positional.first().copied(), "rounds", config.tournament.max_rounds);
    let seed = parse_u64_arg(positional.get(1).copied(), "seed", DEFAULT_SEED);
    let as_table = has_flag(args, "--table");
    let as_csv = has_flag(args, "--csv");

    let (a, b) = demo_fighters();
    let arena = demo_arena();
    let mut rng = Rng::new(seed);
    let log = match resolve_with_balance(&a, &b, &arena, rounds, &config.balance, &mut rng) {
        Ok(log) => log,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };

    if as_csv {
        match rounds_to_csv_string(&log) {
            Ok(payload) => print!("{payload}"),
            Err(err) => {
                eprintln!("failed to export rounds: {err}");
                return 1;
            }
        }
    } else if as_table {
        print!("{}", render_table(&log, seed));
    } else {
        match serde_json::to_string_pretty(&log) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize battle log: {err}");
                return 1;
            }
        }
    }

    0
}

fn handle_tournament(args: &[String], config: &EngineConfig) -> i32 {
    let positional = positional_args(args);
    let Some(roster_path) = positional.first() else {
        eprintln!("usage: colosseum tournament <roster.json> [seed] [--arenas <arenas.json>]");
        return 2;
    };
    // Without an explicit seed every run draws a fresh bracket.
    let seed = match positional.get(1).copied() {
        Some(raw) => parse_u64_arg(Some(raw), "seed", DEFAULT_SEED),
        None => entropy_seed(),
    };
    info!(seed, "tournament seed");

    let fighters = match load_roster(roster_path) {
        Ok(fighters) => fighters,
        Err(err) => {
            eprintln!("roster error: {err}");
            return 1;
        }
    };
    let arenas = match flag_value(args, "--arenas") {
        Some(path) => match load_arenas(path) {
            Ok(arenas) => {
                let report = validate_arenas(&arenas);
                for diag in &report.diagnostics {
                    if diag.severity != ValidationSeverity::Info {
                        eprintln!("- {diag}");
                    }
                }
                arenas
            }
            Err(err) => {
                eprintln!("arena error: {err}");
                return 1;
            }
        },
        None => vec![demo_arena()],
    };

    let mut runner = match TournamentRunner::new(
        &fighters,
        arenas,
        config.tournament,
        config.balance,
        Rng::new(seed),
    ) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("tournament setup failed: {err}");
            return 1;
        }
    };
    let tournament = match runner.run_to_completion() {
        Ok(tournament) => tournament,
        Err(err) => {
            error!("tournament aborted: {err}");
            eprintln!("tournament failed: {err}");
            return 1;
        }
    };

    match serde_json::to_string_pretty(tournament) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize tournament: {err}");
            1
        }
    }
}

fn handle_odds(args: &[String], config: &EngineConfig) -> i32 {
    let positional = positional_args(args);
    let (Some(roster_path), Some(first), Some(second)) =
        (positional.first(), positional.get(1), positional.get(2))
    else {
        eprintln!("usage: colosseum odds <roster.json> <fighter-a> <fighter-b> [iterations] [seed]");
        return 2;
    };
    let iterations = parse_usize_arg(positional.get(3).copied(), "iterations", DEFAULT_ODDS_ITERATIONS);
    let seed = parse_u64_arg(positional.get(4).copied(), "seed", DEFAULT_SEED);

    let fighters = match load_roster(roster_path) {
        Ok(fighters) => fighters,
        Err(err) => {
            eprintln!("roster error: {err}");
            return 1;
        }
    };
    let (Some(a), Some(b)) = (find_fighter(&fighters, first), find_fighter(&fighters, second)) else {
        eprintln!("unknown fighter: expected ids or names from {roster_path}");
        return 1;
    };

    let pool = WorkerPool::with_workers(config.tournament.workers);
    match estimate_odds_with_balance(
        a,
        b,
        &Arena::default(),
        config.tournament.max_rounds,
        &config.balance,
        iterations,
        seed,
        &pool,
    ) {
        Ok(odds) => match serde_json::to_string_pretty(&odds) {
            Ok(payload) => {
                println!("{payload}");
                0
            }
            Err(err) => {
                eprintln!("failed to serialize odds: {err}");
                1
            }
        },
        Err(err) => {
            eprintln!("odds estimate failed: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = positional_args(args).first().copied() else {
        eprintln!("usage: colosseum validate <roster.json>");
        return 2;
    };

    match validate_roster_file(path) {
        Ok(report) => {
            for diag in &report.diagnostics {
                eprintln!("- {diag}");
            }
            if report.has_errors() {
                eprintln!(
                    "validation failed: {} error(s)",
                    report.count(ValidationSeverity::Error)
                );
                1
            } else {
                println!("validation passed: {path}");
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

/// Arguments after the command name, minus flags and flag values.
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            rest.next();
        } else if !arg.starts_with("--") {
            positional.push(arg.as_str());
        }
    }
    positional
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

fn render_table(log: &BattleLog, seed: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "round\tattacker\tdefender\tdamage\tevent\thealth_after");
    for round in &log.rounds {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}/{}",
            round.round,
            round.attacker,
            round.defender,
            round.damage,
            round.random_event.map(|e| e.description()).unwrap_or("-"),
            round.health_after.attacker,
            round.health_after.defender,
        );
    }
    let _ = writeln!(out, "winner\t{}\tseed\t{}", log.winner, seed);
    out
}

fn demo_fighters() -> (Fighter, Fighter) {
    let mut gladiator = Stats::new(180, 26);
    gladiator.agility = 12;
    gladiator.defense = 14;
    gladiator.luck = 8;
    gladiator.size = Size::Large;
    gladiator.build = Build::Muscular;

    let mut duelist = Stats::new(140, 20);
    duelist.agility = 22;
    duelist.defense = 9;
    duelist.luck = 14;
    duelist.size = Size::Small;
    duelist.build = Build::Thin;

    (
        Fighter::new("demo-1", "Varro", gladiator),
        Fighter::new("demo-2", "Lyra", duelist),
    )
}

fn demo_arena() -> Arena {
    Arena::new("Sunken Amphitheater", ["collapsed pillar", "rusted chain", "brazier"])
}

fn parse_u32_arg(raw: Option<&str>, name: &str, default: u32) -> u32 {
    raw.and_then(|value| value.parse::<u32>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_u64_arg(raw: Option<&str>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_usize_arg(raw: Option<&str>, name: &str, default: usize) -> usize {
    raw.and_then(|value| value.parse::<usize>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command(&args(&["colosseum", "odds"])), Some(Command::Odds));
        assert_eq!(parse_command(&args(&["colosseum", "serve"])), None);
        assert_eq!(parse_command(&args(&["colosseum"])), None);
    }

    #[test]
    fn positional_args_skip_flags_and_their_values() {
        let raw = args(&["colosseum", "tournament", "roster.json", "--arenas", "a.json", "42", "--table"]);
        assert_eq!(positional_args(&raw), vec!["roster.json", "42"]);
        assert_eq!(flag_value(&raw, "--arenas"), Some("a.json"));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        assert_eq!(parse_u32_arg(Some("many"), "rounds", 12), 12);
        assert_eq!(parse_u64_arg(Some("9"), "seed", 7), 9);
        assert_eq!(parse_usize_arg(None, "iterations", 1000), 1000);
    }

    #[test]
    fn table_lists_every_round_and_the_verdict() {
        let (a, b) = demo_fighters();
        let log = crate::combat::resolve(&a, &b, &demo_arena(), 5, &mut Rng::new(3)).unwrap();
        let table = render_table(&log, 3);
        assert_eq!(table.lines().count(), log.rounds.len() + 2);
        assert!(table.lines().last().unwrap().starts_with("winner\t"));
    }
}
