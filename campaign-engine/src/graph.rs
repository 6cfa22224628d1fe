//! Scenario definitions and the precondition graph between them.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::bonus::{Bonus, StartMode};
use crate::error::CampaignError;
use crate::ids::{ArtifactId, CreatureId, PlayerColor, ScenarioId};

/// Which parts of a hero survive into the next scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HeroKeeps {
    #[serde(default)]
    pub experience: bool,
    #[serde(default)]
    pub primary_skills: bool,
    #[serde(default)]
    pub secondary_skills: bool,
    #[serde(default)]
    pub spells: bool,
    #[serde(default)]
    pub artifacts: bool,
}

impl HeroKeeps {
    #[must_use]
    pub const fn everything() -> Self {
        Self {
            experience: true,
            primary_skills: true,
            secondary_skills: true,
            spells: true,
            artifacts: true,
        }
    }
}

/// Carry-over and starting rules of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TravelRules {
    #[serde(default)]
    pub keeps: HeroKeeps,
    /// Creature types a hero may bring along.
    #[serde(default)]
    pub monsters_kept: BTreeSet<CreatureId>,
    /// Artifact types a hero may bring along.
    #[serde(default)]
    pub artifacts_kept: BTreeSet<ArtifactId>,
    #[serde(default)]
    pub bonuses: Vec<Bonus>,
    #[serde(default)]
    pub start_mode: StartMode,
    /// Player the fixed bonus applies to.
    #[serde(default)]
    pub player_color: PlayerColor,
}

/// Cut-scene shown before or after a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Narrative {
    #[serde(default)]
    pub video: String,
    #[serde(default)]
    pub music: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Scenario {
    pub map_name: String,
    #[serde(default)]
    pub scenario_name: String,
    #[serde(default)]
    pub preconditions: BTreeSet<ScenarioId>,
    #[serde(default)]
    pub region_color: u8,
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default)]
    pub region_text: String,
    #[serde(default)]
    pub prolog: Option<Narrative>,
    #[serde(default)]
    pub epilog: Option<Narrative>,
    #[serde(default)]
    pub travel: TravelRules,
}

impl Scenario {
    /// Bare scenario with the given map and no preconditions.
    #[must_use]
    pub fn named(map_name: impl Into<String>) -> Self {
        Self {
            map_name: map_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn requiring(mut self, preconditions: impl IntoIterator<Item = ScenarioId>) -> Self {
        self.preconditions.extend(preconditions);
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Immutable scenario graph. Construction guarantees every precondition
/// names a known scenario and that the precondition relation is acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CampaignGraph {
    scenarios: BTreeMap<ScenarioId, Scenario>,
}

impl CampaignGraph {
    /// Build and validate a graph.
    ///
    /// # Errors
    ///
    /// Returns `MalformedGraph` for duplicate ids, unknown or self
    /// preconditions, and precondition cycles.
    pub fn new(
        scenarios: impl IntoIterator<Item = (ScenarioId, Scenario)>,
    ) -> Result<Self, CampaignError> {
        let mut map = BTreeMap::new();
        for (id, scenario) in scenarios {
            if map.insert(id, scenario).is_some() {
                return Err(CampaignError::malformed(format!(
                    "scenario {id} defined twice"
                )));
            }
        }
        let graph = Self { scenarios: map };
        graph.validate()?;
        Ok(graph)
    }

    fn validate(&self) -> Result<(), CampaignError> {
        for (id, scenario) in &self.scenarios {
            if scenario.preconditions.contains(id) {
                return Err(CampaignError::malformed(format!(
                    "scenario {id} lists itself as a precondition"
                )));
            }
            if let Some(missing) = scenario
                .preconditions
                .iter()
                .find(|pre| !self.scenarios.contains_key(pre))
            {
                return Err(CampaignError::malformed(format!(
                    "scenario {id} requires unknown scenario {missing}"
                )));
            }
        }

        let mut marks = BTreeMap::new();
        let mut path = Vec::new();
        for id in self.scenarios.keys() {
            self.visit(*id, &mut marks, &mut path)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        id: ScenarioId,
        marks: &mut BTreeMap<ScenarioId, Mark>,
        path: &mut Vec<ScenarioId>,
    ) -> Result<(), CampaignError> {
        match marks.get(&id) {
            Some(Mark::Visited) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let cycle: Vec<String> = path[start..]
                    .iter()
                    .chain(std::iter::once(&id))
                    .map(ToString::to_string)
                    .collect();
                return Err(CampaignError::malformed(format!(
                    "precondition cycle {}",
                    cycle.join(" -> ")
                )));
            }
            None => {}
        }

        marks.insert(id, Mark::Visiting);
        path.push(id);
        for pre in self.preconditions(id) {
            self.visit(*pre, marks, path)?;
        }
        path.pop();
        marks.insert(id, Mark::Visited);
        Ok(())
    }

    #[must_use]
    pub fn scenario(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ScenarioId) -> bool {
        self.scenarios.contains_key(&id)
    }

    #[must_use]
    pub fn all_scenarios(&self) -> BTreeSet<ScenarioId> {
        self.scenarios.keys().copied().collect()
    }

    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScenarioId, &Scenario)> {
        self.scenarios.iter().map(|(id, s)| (*id, s))
    }

    /// Preconditions of a scenario; empty for unknown ids.
    pub fn preconditions(&self, id: ScenarioId) -> impl Iterator<Item = &ScenarioId> {
        self.scenarios
            .get(&id)
            .into_iter()
            .flat_map(|s| s.preconditions.iter())
    }

    /// True when every precondition of `id` is conquered and `id` itself is not.
    #[must_use]
    pub fn is_available(&self, id: ScenarioId, conquered: &[ScenarioId]) -> bool {
        self.contains(id)
            && !conquered.contains(&id)
            && self.preconditions(id).all(|pre| conquered.contains(pre))
    }

    #[must_use]
    pub fn is_finished(&self, conquered: &[ScenarioId]) -> bool {
        self.scenarios.keys().all(|id| conquered.contains(id))
    }

    /// Deterministic order in which every scenario follows its preconditions;
    /// among ready scenarios the lowest id comes first.
    #[must_use]
    pub fn topological_order(&self) -> Vec<ScenarioId> {
        let mut order: Vec<ScenarioId> = Vec::with_capacity(self.scenarios.len());
        while order.len() < self.scenarios.len() {
            let next = self
                .scenarios
                .keys()
                .copied()
                .find(|id| self.is_available(*id, &order));
            match next {
                Some(id) => order.push(id),
                None => break,
            }
        }
        order
    }
}
