//! Campaign being played: shared definition plus the player's progress.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::MapDecoder;
use crate::bonus::{Bonus, BonusCatalog, StartMode};
use crate::crossover::{CrossoverLedger, PlacedHero, Placement};
use crate::definition::CampaignDefinition;
use crate::error::CampaignError;
use crate::graph::CampaignGraph;
use crate::hero::{HeroInstance, HeroSnapshot};
use crate::ids::{PlayerColor, ScenarioId};
use crate::progress::{ProgressTracker, ScenarioStatus};

/// One player's playthrough of a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignState {
    definition: Arc<CampaignDefinition>,
    map_blobs: BTreeMap<ScenarioId, Vec<u8>>,
    progress: ProgressTracker,
    crossover: CrossoverLedger,
}

impl CampaignState {
    /// Fresh playthrough with the mission data of every scenario.
    ///
    /// # Errors
    ///
    /// Returns `UnknownScenario` if a blob is keyed by a scenario the
    /// definition does not contain.
    pub fn new(
        definition: Arc<CampaignDefinition>,
        map_blobs: BTreeMap<ScenarioId, Vec<u8>>,
    ) -> Result<Self, CampaignError> {
        if let Some(unknown) = map_blobs
            .keys()
            .find(|id| !definition.graph().contains(**id))
        {
            return Err(CampaignError::UnknownScenario(*unknown));
        }
        Ok(Self {
            definition,
            map_blobs,
            progress: ProgressTracker::default(),
            crossover: CrossoverLedger::default(),
        })
    }

    /// Reassemble a restored playthrough, checking every progress invariant.
    pub(crate) fn restore(
        definition: Arc<CampaignDefinition>,
        map_blobs: BTreeMap<ScenarioId, Vec<u8>>,
        progress: ProgressTracker,
        crossover: CrossoverLedger,
    ) -> Result<Self, CampaignError> {
        let mut state = Self::new(definition, map_blobs)
            .map_err(|err| CampaignError::format(err.to_string()))?;
        state.progress = progress;
        state.crossover = crossover;
        state.check_invariants()?;
        Ok(state)
    }

    fn check_invariants(&self) -> Result<(), CampaignError> {
        let graph = self.graph();
        let mut seen: Vec<ScenarioId> = Vec::new();
        for id in self.progress.conquered_order() {
            if !graph.is_available(*id, &seen) {
                return Err(CampaignError::format(format!(
                    "scenario {id} conquered out of order or twice"
                )));
            }
            seen.push(*id);
        }

        if let Some(current) = self.progress.current_scenario()
            && !graph.is_available(current, &seen)
        {
            return Err(CampaignError::format(format!(
                "scenario {current} is current but not available"
            )));
        }

        for (id, index) in self.progress.chosen_bonuses() {
            let active = self.progress.is_conquered(*id)
                || self.progress.current_scenario() == Some(*id);
            if !active || self.catalog().resolve(*id, *index).is_err() {
                return Err(CampaignError::format(format!(
                    "scenario {id} has an invalid chosen bonus {index}"
                )));
            }
        }

        if let Some(id) = self
            .crossover
            .crossover_map()
            .keys()
            .find(|id| !self.progress.is_conquered(**id))
        {
            return Err(CampaignError::format(format!(
                "crossover heroes recorded for unconquered scenario {id}"
            )));
        }

        for (id, placed) in self.crossover.placed_map() {
            if !self.progress.is_conquered(*id) && self.progress.current_scenario() != Some(*id) {
                return Err(CampaignError::format(format!(
                    "heroes placed into scenario {id} which is neither current nor conquered"
                )));
            }
            let mut placed_ids = BTreeSet::new();
            if let Some(repeat) = placed.iter().find(|p| !placed_ids.insert(p.hero.id)) {
                return Err(CampaignError::format(format!(
                    "hero {} placed into scenario {id} more than once",
                    repeat.hero.id
                )));
            }
            let available: BTreeSet<_> = self
                .heroes_available_for(*id)
                .into_iter()
                .map(|hero| hero.id)
                .collect();
            if let Some(stray) = placed.iter().find(|p| !available.contains(&p.hero.id)) {
                return Err(CampaignError::format(format!(
                    "hero {} placed into scenario {id} without being eligible",
                    stray.hero.id
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn definition(&self) -> &Arc<CampaignDefinition> {
        &self.definition
    }

    #[must_use]
    pub fn graph(&self) -> &CampaignGraph {
        self.definition.graph()
    }

    fn catalog(&self) -> &BonusCatalog {
        self.definition.catalog()
    }

    #[must_use]
    pub const fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    #[must_use]
    pub const fn crossover(&self) -> &CrossoverLedger {
        &self.crossover
    }

    #[must_use]
    pub const fn map_blobs(&self) -> &BTreeMap<ScenarioId, Vec<u8>> {
        &self.map_blobs
    }

    /// Raw mission bytes of a scenario.
    #[must_use]
    pub fn map_data(&self, scenario: ScenarioId) -> Option<&[u8]> {
        self.map_blobs.get(&scenario).map(Vec::as_slice)
    }

    /// Hand a scenario's stored mission bytes to an external decoder.
    ///
    /// # Errors
    ///
    /// Returns `MissingMapData` when no blob is stored, or the decoder's error
    /// converted into `anyhow::Error`.
    pub fn decode_map<D>(&self, decoder: &D, scenario: ScenarioId) -> anyhow::Result<D::Map>
    where
        D: MapDecoder,
    {
        let bytes = self
            .map_data(scenario)
            .ok_or(CampaignError::MissingMapData(scenario))?;
        Ok(decoder.decode(scenario, bytes)?)
    }

    #[must_use]
    pub fn is_available(&self, scenario: ScenarioId) -> bool {
        self.progress.is_available(self.graph(), scenario)
    }

    #[must_use]
    pub fn is_conquered(&self, scenario: ScenarioId) -> bool {
        self.progress.is_conquered(scenario)
    }

    #[must_use]
    pub fn is_campaign_finished(&self) -> bool {
        self.progress.is_campaign_finished(self.graph())
    }

    #[must_use]
    pub fn scenario_status(&self, scenario: ScenarioId) -> ScenarioStatus {
        self.progress.scenario_status(self.graph(), scenario)
    }

    /// Scenarios the player may start right now.
    #[must_use]
    pub fn available_scenarios(&self) -> Vec<ScenarioId> {
        self.graph()
            .iter()
            .map(|(id, _)| id)
            .filter(|id| self.is_available(*id))
            .collect()
    }

    #[must_use]
    pub const fn current_scenario(&self) -> Option<ScenarioId> {
        self.progress.current_scenario()
    }

    #[must_use]
    pub fn last_scenario(&self) -> Option<ScenarioId> {
        self.progress.last_scenario()
    }

    #[must_use]
    pub fn conquered_scenarios(&self) -> BTreeSet<ScenarioId> {
        self.progress.conquered_scenarios()
    }

    #[must_use]
    pub fn conquered_order(&self) -> &[ScenarioId] {
        self.progress.conquered_order()
    }

    #[must_use]
    pub fn bonus_id(&self, scenario: ScenarioId) -> Option<u8> {
        self.progress.bonus_id(scenario)
    }

    /// Bonus in effect for a scenario: the player's pick, or the fixed one.
    #[must_use]
    pub fn bonus(&self, scenario: ScenarioId) -> Option<Bonus> {
        let catalog = self.catalog();
        match catalog.start_mode(scenario) {
            StartMode::ChooseBonus => self
                .bonus_id(scenario)
                .and_then(|index| catalog.resolve(scenario, index).ok()),
            StartMode::FixedBonus => catalog.bonuses_for(scenario).first().copied(),
            StartMode::None | StartMode::HeroCrossover => None,
        }
    }

    /// # Errors
    ///
    /// See [`ProgressTracker::set_current_map`].
    pub fn set_current_map(&mut self, scenario: ScenarioId) -> Result<(), CampaignError> {
        let graph = self.definition.graph();
        self.progress.set_current_map(graph, scenario)
    }

    /// # Errors
    ///
    /// See [`ProgressTracker::set_current_map_bonus`].
    pub fn set_current_map_bonus(&mut self, index: u8) -> Result<(), CampaignError> {
        let catalog = self.definition.catalog();
        self.progress.set_current_map_bonus(catalog, index)
    }

    /// Finish the scenario in progress with the heroes that survived it.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveScenario` when nothing is being played; the state is
    /// left untouched on error.
    pub fn set_current_map_as_conquered(
        &mut self,
        survivors: &[HeroInstance],
    ) -> Result<ScenarioId, CampaignError> {
        let current = self
            .progress
            .current_scenario()
            .ok_or(CampaignError::NoActiveScenario)?;
        let keeps = self
            .definition
            .scenario(current)
            .map(|scenario| scenario.travel.keeps)
            .unwrap_or_default();
        let snapshots = survivors
            .iter()
            .map(|hero| HeroSnapshot::capture(hero, keeps))
            .collect();

        self.crossover.record_crossover(current, snapshots)?;
        let conquered = self.progress.conquer_current()?;
        log::info!(
            "scenario {conquered} of '{}' conquered with {} surviving heroes",
            self.definition.name(),
            survivors.len()
        );
        if self.is_campaign_finished() {
            log::info!("campaign '{}' finished", self.definition.name());
        }
        Ok(conquered)
    }

    #[must_use]
    pub fn crossover_heroes(&self, scenario: ScenarioId) -> &[HeroSnapshot] {
        self.crossover.crossover_heroes(scenario)
    }

    /// Heroes eligible to travel into `scenario`, filtered by its travel rules.
    #[must_use]
    pub fn heroes_available_for(&self, scenario: ScenarioId) -> Vec<HeroSnapshot> {
        self.crossover
            .heroes_available_for(self.graph(), self.conquered_order(), scenario)
    }

    /// Insert crossover heroes into the starting positions of the scenario in
    /// progress.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioNotInProgress` unless `scenario` is being played,
    /// `HeroNotEligible` for heroes that may not travel into it, and
    /// `HeroAlreadyPlaced` for duplicates.
    pub fn place_heroes(
        &mut self,
        scenario: ScenarioId,
        placements: &[Placement],
    ) -> Result<(), CampaignError> {
        if self.current_scenario() != Some(scenario) {
            return Err(CampaignError::ScenarioNotInProgress(scenario));
        }
        let available = self.heroes_available_for(scenario);
        self.crossover.place_heroes(scenario, &available, placements)
    }

    #[must_use]
    pub fn placed_heroes(&self, scenario: ScenarioId) -> &[PlacedHero] {
        self.crossover.placed_heroes(scenario)
    }

    #[must_use]
    pub fn strongest_hero(&self, scenario: ScenarioId, owner: PlayerColor) -> Option<&HeroSnapshot> {
        self.crossover.strongest_hero(scenario, owner)
    }

    /// Heroes that could have travelled into `scenario` but were not placed.
    #[must_use]
    pub fn lost_crossover_heroes(&self, scenario: ScenarioId) -> Vec<HeroSnapshot> {
        self.crossover
            .lost_crossover_heroes(self.heroes_available_for(scenario), scenario)
    }

    /// Forget all progress; mission data is kept.
    pub fn restart(&mut self) {
        log::info!("campaign '{}' restarted", self.definition.name());
        self.progress.reset();
        self.crossover.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::CampaignHeader;
    use crate::graph::{HeroKeeps, Scenario};
    use crate::hero::PrimarySkills;
    use crate::ids::HeroId;
    use std::convert::Infallible;

    fn id(n: u8) -> ScenarioId {
        ScenarioId(n)
    }

    fn two_step() -> CampaignState {
        let mut first = Scenario::named("a");
        first.travel.keeps = HeroKeeps {
            experience: true,
            ..HeroKeeps::default()
        };
        let mut second = Scenario::named("b").requiring([id(0)]);
        second.travel.start_mode = StartMode::FixedBonus;
        second.travel.bonuses = vec![Bonus::Building { building: 3 }];
        let graph = CampaignGraph::new([(id(0), first), (id(1), second)]).unwrap();
        let header = CampaignHeader {
            name: "two step".to_string(),
            ..CampaignHeader::default()
        };
        let definition = Arc::new(CampaignDefinition::new(header, graph));
        let blobs = BTreeMap::from([(id(0), vec![1, 2, 3]), (id(1), vec![4, 5])]);
        CampaignState::new(definition, blobs).unwrap()
    }

    fn hero() -> HeroInstance {
        HeroInstance {
            id: HeroId(8),
            owner: PlayerColor(0),
            experience: 1_500,
            primary: PrimarySkills {
                attack: 3,
                ..PrimarySkills::default()
            },
            spells: BTreeSet::from([1]),
            ..HeroInstance::default()
        }
    }

    struct LengthDecoder;

    impl MapDecoder for LengthDecoder {
        type Map = usize;
        type Error = Infallible;

        fn decode(&self, _scenario: ScenarioId, bytes: &[u8]) -> Result<usize, Infallible> {
            Ok(bytes.len())
        }
    }

    #[test]
    fn conquest_unlocks_successor_and_snapshots_kept_attributes() {
        let mut state = two_step();
        assert!(state.is_available(id(0)));
        assert!(!state.is_available(id(1)));
        assert_eq!(
            state.set_current_map(id(1)),
            Err(CampaignError::NotAvailable(id(1)))
        );

        state.set_current_map(id(0)).unwrap();
        assert_eq!(state.set_current_map_as_conquered(&[hero()]), Ok(id(0)));
        assert!(state.is_available(id(1)));

        let crossover = state.crossover_heroes(id(0));
        assert_eq!(crossover.len(), 1);
        assert_eq!(crossover[0].experience, Some(1_500));
        assert!(crossover[0].primary.is_none());
        assert!(crossover[0].spells.is_empty());
    }

    #[test]
    fn conquering_without_active_scenario_changes_nothing() {
        let mut state = two_step();
        let before = state.clone();
        assert_eq!(
            state.set_current_map_as_conquered(&[hero()]),
            Err(CampaignError::NoActiveScenario)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn fixed_bonus_is_reported_without_a_choice() {
        let mut state = two_step();
        assert_eq!(state.bonus(id(0)), None);
        assert_eq!(state.bonus(id(1)), Some(Bonus::Building { building: 3 }));
        state.set_current_map(id(0)).unwrap();
        assert!(state.set_current_map_bonus(0).is_err());
        assert_eq!(state.bonus_id(id(0)), None);
    }

    #[test]
    fn placement_requires_scenario_in_progress() {
        let mut state = two_step();
        state.set_current_map(id(0)).unwrap();
        state.set_current_map_as_conquered(&[hero()]).unwrap();
        let placement = [Placement {
            hero: HeroId(8),
            placeholder: 0,
        }];
        assert_eq!(
            state.place_heroes(id(1), &placement),
            Err(CampaignError::ScenarioNotInProgress(id(1)))
        );
        state.set_current_map(id(1)).unwrap();
        state.place_heroes(id(1), &placement).unwrap();
        assert_eq!(state.placed_heroes(id(1)).len(), 1);
        assert!(state.lost_crossover_heroes(id(1)).is_empty());
        assert_eq!(
            state.strongest_hero(id(1), PlayerColor(0)).unwrap().id,
            HeroId(8)
        );
    }

    #[test]
    fn map_blobs_are_handed_to_decoder() {
        let state = two_step();
        assert_eq!(state.decode_map(&LengthDecoder, id(0)).unwrap(), 3);
        assert_eq!(state.map_data(id(1)), Some(&[4, 5][..]));
        let err = state.decode_map(&LengthDecoder, id(7)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CampaignError>(),
            Some(&CampaignError::MissingMapData(id(7)))
        );
    }

    #[test]
    fn restart_resets_progress_but_keeps_blobs() {
        let mut state = two_step();
        state.set_current_map(id(0)).unwrap();
        state.set_current_map_as_conquered(&[hero()]).unwrap();
        state.restart();
        assert!(state.conquered_scenarios().is_empty());
        assert!(state.crossover_heroes(id(0)).is_empty());
        assert_eq!(state.map_blobs().len(), 2);
        assert_eq!(state.available_scenarios(), vec![id(0)]);
    }

    #[test]
    fn blobs_for_unknown_scenarios_are_rejected() {
        let state = two_step();
        let result = CampaignState::new(
            Arc::clone(state.definition()),
            BTreeMap::from([(id(5), Vec::new())]),
        );
        assert_eq!(result, Err(CampaignError::UnknownScenario(id(5))));
    }
}
