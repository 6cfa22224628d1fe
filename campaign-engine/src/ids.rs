//! Strongly typed identifiers used across campaign data.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a scenario within its campaign.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ScenarioId(pub u8);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ScenarioId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Identity of a hero; stable across scenarios.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct HeroId(pub u32);

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owning player slot. Colors `0..8` are playable, anything else is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerColor(pub u8);

impl PlayerColor {
    pub const NEUTRAL: Self = Self(255);
    pub const PLAYER_LIMIT: u8 = 8;

    #[must_use]
    pub const fn is_neutral(self) -> bool {
        self.0 >= Self::PLAYER_LIMIT
    }
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 8] = [
            "red", "blue", "tan", "green", "orange", "purple", "teal", "pink",
        ];
        match NAMES.get(usize::from(self.0)) {
            Some(name) => f.write_str(name),
            None => f.write_str("neutral"),
        }
    }
}

pub type CreatureId = i32;
pub type ArtifactId = i32;
pub type SpellId = i32;
pub type SkillId = i32;
