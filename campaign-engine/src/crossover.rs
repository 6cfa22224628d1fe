//! Ledger of heroes carried between scenarios.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::CampaignError;
use crate::graph::CampaignGraph;
use crate::hero::HeroSnapshot;
use crate::ids::{HeroId, PlayerColor, ScenarioId};

/// A crossover hero inserted at one of a scenario's starting positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedHero {
    pub placeholder: u8,
    pub hero: HeroSnapshot,
}

/// Request to put a hero into a starting position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub hero: HeroId,
    pub placeholder: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrossoverLedger {
    crossover: BTreeMap<ScenarioId, Vec<HeroSnapshot>>,
    placed: BTreeMap<ScenarioId, Vec<PlacedHero>>,
}

impl CrossoverLedger {
    pub(crate) fn from_parts(
        crossover: BTreeMap<ScenarioId, Vec<HeroSnapshot>>,
        placed: BTreeMap<ScenarioId, Vec<PlacedHero>>,
    ) -> Self {
        Self { crossover, placed }
    }

    pub(crate) const fn crossover_map(&self) -> &BTreeMap<ScenarioId, Vec<HeroSnapshot>> {
        &self.crossover
    }

    pub(crate) const fn placed_map(&self) -> &BTreeMap<ScenarioId, Vec<PlacedHero>> {
        &self.placed
    }

    /// Store the heroes that finished `scenario`.
    ///
    /// # Errors
    ///
    /// Returns `CrossoverAlreadyRecorded` if the scenario already has a record.
    pub fn record_crossover(
        &mut self,
        scenario: ScenarioId,
        heroes: Vec<HeroSnapshot>,
    ) -> Result<(), CampaignError> {
        if self.crossover.contains_key(&scenario) {
            return Err(CampaignError::CrossoverAlreadyRecorded(scenario));
        }
        log::debug!(
            "recording {} crossover heroes for scenario {scenario}",
            heroes.len()
        );
        self.crossover.insert(scenario, heroes);
        Ok(())
    }

    #[must_use]
    pub fn crossover_heroes(&self, scenario: ScenarioId) -> &[HeroSnapshot] {
        self.crossover.get(&scenario).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_recorded(&self, scenario: ScenarioId) -> bool {
        self.crossover.contains_key(&scenario)
    }

    /// Heroes that may travel into `scenario`.
    ///
    /// Preconditions are visited in completion order. A hero recorded by
    /// several of them keeps its first position but takes its most recent
    /// state. The scenario's allow-lists strip artifacts and creatures, never
    /// the hero.
    #[must_use]
    pub fn heroes_available_for(
        &self,
        graph: &CampaignGraph,
        conquered_order: &[ScenarioId],
        scenario: ScenarioId,
    ) -> Vec<HeroSnapshot> {
        let Some(target) = graph.scenario(scenario) else {
            return Vec::new();
        };

        let mut merged: Vec<HeroSnapshot> = Vec::new();
        let sources = conquered_order
            .iter()
            .filter(|id| target.preconditions.contains(id));
        for source in sources {
            for hero in self.crossover_heroes(*source) {
                match merged.iter_mut().find(|known| known.id == hero.id) {
                    Some(known) => *known = hero.clone(),
                    None => merged.push(hero.clone()),
                }
            }
        }

        merged
            .iter()
            .map(|hero| hero.filtered_for(&target.travel))
            .collect()
    }

    /// Record which available heroes were inserted into `scenario`.
    /// The whole batch is checked before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns `HeroNotEligible` when a placement names a hero outside
    /// `available`, and `HeroAlreadyPlaced` when a hero would be placed twice.
    pub fn place_heroes(
        &mut self,
        scenario: ScenarioId,
        available: &[HeroSnapshot],
        placements: &[Placement],
    ) -> Result<(), CampaignError> {
        let mut taken: BTreeSet<HeroId> = self
            .placed_heroes(scenario)
            .iter()
            .map(|placed| placed.hero.id)
            .collect();

        let mut batch = Vec::with_capacity(placements.len());
        for placement in placements {
            let hero = available
                .iter()
                .find(|hero| hero.id == placement.hero)
                .ok_or(CampaignError::HeroNotEligible {
                    scenario,
                    hero: placement.hero,
                })?;
            if !taken.insert(placement.hero) {
                return Err(CampaignError::HeroAlreadyPlaced {
                    scenario,
                    hero: placement.hero,
                });
            }
            batch.push(PlacedHero {
                placeholder: placement.placeholder,
                hero: hero.clone(),
            });
        }

        log::debug!("placing {} heroes into scenario {scenario}", batch.len());
        self.placed.entry(scenario).or_default().extend(batch);
        Ok(())
    }

    #[must_use]
    pub fn placed_heroes(&self, scenario: ScenarioId) -> &[PlacedHero] {
        self.placed.get(&scenario).map_or(&[], Vec::as_slice)
    }

    /// Strongest placed hero of `owner` in `scenario`; ties go to the lowest id.
    #[must_use]
    pub fn strongest_hero(&self, scenario: ScenarioId, owner: PlayerColor) -> Option<&HeroSnapshot> {
        self.placed_heroes(scenario)
            .iter()
            .map(|placed| &placed.hero)
            .filter(|hero| hero.owner == owner)
            .max_by(|a, b| {
                a.power_score()
                    .total_cmp(&b.power_score())
                    .then_with(|| b.id.cmp(&a.id))
            })
    }

    /// Available heroes that were not placed into `scenario`.
    #[must_use]
    pub fn lost_crossover_heroes(
        &self,
        available: Vec<HeroSnapshot>,
        scenario: ScenarioId,
    ) -> Vec<HeroSnapshot> {
        let placed: BTreeSet<HeroId> = self
            .placed_heroes(scenario)
            .iter()
            .map(|placed| placed.hero.id)
            .collect();
        available
            .into_iter()
            .filter(|hero| !placed.contains(&hero.id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.crossover.clear();
        self.placed.clear();
    }
}
