use serde::{Deserialize, Serialize};

use crate::combat::{Arena, BattleLog, Fighter};
use crate::tournament::stats::NotableMoment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Setup,
    InProgress,
    Completed,
}

/// Commentary fields. Written by the narrative layer, never by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MatchNarrative {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_match: Option<String>,
    #[serde(default)]
    pub notable_moments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentMatch {
    pub id: String,
    pub fighter_a: Option<Fighter>,
    pub fighter_b: Option<Fighter>,
    #[serde(default)]
    pub winner: Option<Fighter>,
    pub status: MatchStatus,
    pub round: u32,
    pub match_number: u32,
    #[serde(default)]
    pub arena: Option<Arena>,
    #[serde(default)]
    pub battle_log: Option<BattleLog>,
    #[serde(default)]
    pub narrative: MatchNarrative,
}

impl TournamentMatch {
    pub fn match_id(round: u32, match_number: u32) -> String {
        format!("r{round}-m{match_number}")
    }

    pub fn empty(round: u32, match_number: u32) -> Self {
        Self {
            id: Self::match_id(round, match_number),
            fighter_a: None,
            fighter_b: None,
            winner: None,
            status: MatchStatus::Pending,
            round,
            match_number,
            arena: None,
            battle_log: None,
            narrative: MatchNarrative::default(),
        }
    }

    /// A lone fighter advances without a bout.
    pub fn bye(round: u32, match_number: u32, fighter: Fighter) -> Self {
        Self {
            fighter_a: Some(fighter.clone()),
            winner: Some(fighter),
            status: MatchStatus::Completed,
            ..Self::empty(round, match_number)
        }
    }

    pub fn is_bye(&self) -> bool {
        self.status == MatchStatus::Completed && self.battle_log.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Both slots filled and not yet played.
    pub fn is_ready(&self) -> bool {
        self.status == MatchStatus::Pending && self.fighter_a.is_some() && self.fighter_b.is_some()
    }

    pub fn fighter_count(&self) -> usize {
        usize::from(self.fighter_a.is_some()) + usize::from(self.fighter_b.is_some())
    }

    /// The fighter in this match who did not win. None for byes and undecided matches.
    pub fn loser(&self) -> Option<&Fighter> {
        let winner = self.winner.as_ref()?;
        [self.fighter_a.as_ref(), self.fighter_b.as_ref()]
            .into_iter()
            .flatten()
            .find(|f| f.id != winner.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentBracket {
    pub round: u32,
    pub matches: Vec<TournamentMatch>,
}

impl TournamentBracket {
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(TournamentMatch::is_completed)
    }

    pub fn find_match(&self, match_number: u32) -> Option<&TournamentMatch> {
        self.matches.iter().find(|m| m.match_number == match_number)
    }

    pub fn find_match_mut(&mut self, match_number: u32) -> Option<&mut TournamentMatch> {
        self.matches.iter_mut().find(|m| m.match_number == match_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: String,
    pub created_at: String,
    pub brackets: Vec<TournamentBracket>,
    pub fighters: Vec<Fighter>,
    pub current_round: u32,
    pub status: TournamentStatus,
    #[serde(default)]
    pub winner: Option<Fighter>,
    #[serde(default)]
    pub notable_moments: Vec<NotableMoment>,
}

impl Tournament {
    pub fn new(fighters: Vec<Fighter>, brackets: Vec<TournamentBracket>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            brackets,
            fighters,
            current_round: 1,
            status: TournamentStatus::Setup,
            winner: None,
            notable_moments: Vec::new(),
        }
    }

    pub fn bracket(&self, round: u32) -> Option<&TournamentBracket> {
        self.brackets.iter().find(|b| b.round == round)
    }

    pub fn find_match(&self, match_id: &str) -> Option<&TournamentMatch> {
        self.brackets
            .iter()
            .flat_map(|b| b.matches.iter())
            .find(|m| m.id == match_id)
    }
}
