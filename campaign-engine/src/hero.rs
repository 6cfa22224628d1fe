//! Live heroes reported by the map layer and the crossover records made from them.
use num_traits::cast;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::error::CampaignError;
use crate::graph::{HeroKeeps, TravelRules};
use crate::ids::{ArtifactId, CreatureId, HeroId, PlayerColor, SkillId, SpellId};

/// Version of the crossover record layout written by this build.
pub const HERO_RECORD_VERSION: u16 = 1;

/// Maximum number of creature stacks a hero commands.
pub const ARMY_SLOTS: usize = 7;

const SKILL_WEIGHT: f64 = 0.05;
const EXPERIENCE_PER_LEVEL_FACTOR: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PrimarySkills {
    pub attack: i32,
    pub defense: i32,
    pub spell_power: i32,
    pub knowledge: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecondarySkill {
    pub skill: SkillId,
    pub mastery: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArmyStack {
    pub creature: CreatureId,
    pub count: u32,
}

pub type Army = SmallVec<[ArmyStack; ARMY_SLOTS]>;

/// A hero as it exists on the map when a scenario ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HeroInstance {
    pub id: HeroId,
    pub owner: PlayerColor,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub primary: PrimarySkills,
    #[serde(default)]
    pub secondary: Vec<SecondarySkill>,
    #[serde(default)]
    pub spells: BTreeSet<SpellId>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactId>,
    #[serde(default)]
    pub army: Army,
}

/// Crossover record of a hero.
///
/// Attributes a scenario does not let a hero keep are `None` or empty;
/// identity, owner and name always survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSnapshot {
    #[serde(default = "default_record_version")]
    pub record_version: u16,
    pub id: HeroId,
    pub owner: PlayerColor,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<PrimarySkills>,
    #[serde(default)]
    pub secondary: Vec<SecondarySkill>,
    #[serde(default)]
    pub spells: BTreeSet<SpellId>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactId>,
    #[serde(default)]
    pub army: Army,
}

const fn default_record_version() -> u16 {
    HERO_RECORD_VERSION
}

impl HeroSnapshot {
    /// Snapshot of a surviving hero, keeping only what `keeps` allows.
    /// The army always travels; which creatures may enter the next scenario
    /// is decided there.
    #[must_use]
    pub fn capture(hero: &HeroInstance, keeps: HeroKeeps) -> Self {
        Self {
            record_version: HERO_RECORD_VERSION,
            id: hero.id,
            owner: hero.owner,
            name: hero.name.clone(),
            experience: keeps.experience.then_some(hero.experience),
            primary: keeps.primary_skills.then_some(hero.primary),
            secondary: if keeps.secondary_skills {
                hero.secondary.clone()
            } else {
                Vec::new()
            },
            spells: if keeps.spells {
                hero.spells.clone()
            } else {
                BTreeSet::new()
            },
            artifacts: if keeps.artifacts {
                hero.artifacts.clone()
            } else {
                Vec::new()
            },
            army: hero.army.clone(),
        }
    }

    /// Copy of the snapshot with artifacts and creatures outside the
    /// scenario's allow-lists removed.
    #[must_use]
    pub fn filtered_for(&self, rules: &TravelRules) -> Self {
        let mut filtered = self.clone();
        filtered
            .artifacts
            .retain(|artifact| rules.artifacts_kept.contains(artifact));
        filtered
            .army
            .retain(|stack| rules.monsters_kept.contains(&stack.creature));
        filtered
    }

    /// True when nothing beyond identity is carried over.
    #[must_use]
    pub fn is_empty_carryover(&self) -> bool {
        self.experience.is_none()
            && self.primary.is_none()
            && self.secondary.is_empty()
            && self.spells.is_empty()
            && self.artifacts.is_empty()
            && self.army.is_empty()
    }

    /// Overall strength used to pick a scenario's strongest hero.
    #[must_use]
    pub fn power_score(&self) -> f64 {
        let skills = self.primary.unwrap_or_default();
        let weigh = |value: i32| 1.0 + SKILL_WEIGHT * f64::from(value.max(0));
        let fighting = (weigh(skills.attack) * weigh(skills.defense)).sqrt();
        let magic = (weigh(skills.spell_power) * weigh(skills.knowledge)).sqrt();
        let experience = cast::<u64, f64>(self.experience.unwrap_or(0)).unwrap_or(0.0);
        fighting * magic * (1.0 + experience / EXPERIENCE_PER_LEVEL_FACTOR)
    }

    /// Encode the record as a generic JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Definition` if the record cannot be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, CampaignError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a record from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Definition` for malformed documents and `UnsupportedVersion`
    /// for records written by a newer build.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CampaignError> {
        let snapshot: Self = serde_json::from_value(value.clone())?;
        check_record_version(snapshot.record_version)?;
        Ok(snapshot)
    }
}

/// Records tagged by a newer build are refused.
pub(crate) fn check_record_version(version: u16) -> Result<(), CampaignError> {
    if version > HERO_RECORD_VERSION {
        return Err(CampaignError::UnsupportedVersion {
            found: u32::from(version),
            min: 1,
            max: u32::from(HERO_RECORD_VERSION),
        });
    }
    Ok(())
}
