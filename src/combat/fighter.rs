//! Fighter and arena records. These are caller-owned inputs; the resolver never mutates them.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Build {
    Thin,
    #[default]
    Average,
    Muscular,
    Heavy,
}

impl Build {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Thin => "thin",
            Self::Average => "average",
            Self::Muscular => "muscular",
            Self::Heavy => "heavy",
        }
    }
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub health: u32,
    pub max_health: u32,
    pub strength: u32,
    pub agility: u32,
    pub defense: u32,
    pub luck: u32,
    pub age: u32,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub build: Build,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranged: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intelligence: Option<u32>,
    #[serde(default)]
    pub unique_abilities: Vec<String>,
}

impl Stats {
    /// Baseline block with the given health (also used as max health) and strength.
    /// Remaining core stats default to 10.
    pub fn new(health: u32, strength: u32) -> Self {
        Self {
            health,
            max_health: health,
            strength,
            agility: 10,
            defense: 10,
            luck: 10,
            age: 25,
            size: Size::default(),
            build: Build::default(),
            magic: None,
            ranged: None,
            intelligence: None,
            unique_abilities: Vec::new(),
        }
    }

    /// `strength × health`; decides whether a bout runs in underdog mode.
    pub fn power(&self) -> u64 {
        u64::from(self.strength) * u64::from(self.health)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fighter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub stats: Stats,
}

impl Fighter {
    pub fn new(id: impl Into<String>, name: impl Into<String>, stats: Stats) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: String::new(),
            stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub environmental_objects: Vec<String>,
}

impl Arena {
    pub fn new<I, S>(name: impl Into<String>, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            image: String::new(),
            description: None,
            environmental_objects: objects.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for Arena {
    /// Object-less neutral ground, used when a match has no arena assignment.
    fn default() -> Self {
        Self::new("Neutral Ground", std::iter::empty::<String>())
    }
}
