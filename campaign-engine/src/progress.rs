//! Per-playthrough scenario progress state machine.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::bonus::BonusCatalog;
use crate::error::CampaignError;
use crate::graph::CampaignGraph;
use crate::ids::ScenarioId;

/// Where a scenario stands from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Locked,
    Available,
    InProgress,
    Conquered,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressTracker {
    /// Conquered scenarios in completion order.
    conquered: Vec<ScenarioId>,
    current: Option<ScenarioId>,
    chosen_bonus: BTreeMap<ScenarioId, u8>,
}

impl ProgressTracker {
    pub(crate) const fn from_parts(
        conquered: Vec<ScenarioId>,
        current: Option<ScenarioId>,
        chosen_bonus: BTreeMap<ScenarioId, u8>,
    ) -> Self {
        Self {
            conquered,
            current,
            chosen_bonus,
        }
    }

    pub(crate) const fn chosen_bonuses(&self) -> &BTreeMap<ScenarioId, u8> {
        &self.chosen_bonus
    }

    /// Start playing `scenario`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInProgress` while another scenario is being played and
    /// `NotAvailable` when the scenario's preconditions are unmet or it is
    /// already conquered.
    pub fn set_current_map(
        &mut self,
        graph: &CampaignGraph,
        scenario: ScenarioId,
    ) -> Result<(), CampaignError> {
        if let Some(current) = self.current {
            return Err(CampaignError::AlreadyInProgress { current });
        }
        if !graph.is_available(scenario, &self.conquered) {
            return Err(CampaignError::NotAvailable(scenario));
        }
        log::debug!("scenario {scenario} started");
        self.current = Some(scenario);
        Ok(())
    }

    /// Pick the starting bonus of the scenario in progress.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveScenario` if nothing is being played and
    /// `InvalidBonusIndex` if `index` is not a choosable bonus.
    pub fn set_current_map_bonus(
        &mut self,
        catalog: &BonusCatalog,
        index: u8,
    ) -> Result<(), CampaignError> {
        let current = self.current.ok_or(CampaignError::NoActiveScenario)?;
        catalog.resolve(current, index)?;
        log::debug!("scenario {current} bonus {index} chosen");
        self.chosen_bonus.insert(current, index);
        Ok(())
    }

    /// Mark the scenario in progress as conquered and return its id.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveScenario` if nothing is being played.
    pub fn conquer_current(&mut self) -> Result<ScenarioId, CampaignError> {
        let current = self.current.take().ok_or(CampaignError::NoActiveScenario)?;
        self.conquered.push(current);
        Ok(current)
    }

    #[must_use]
    pub const fn current_scenario(&self) -> Option<ScenarioId> {
        self.current
    }

    /// Most recently conquered scenario.
    #[must_use]
    pub fn last_scenario(&self) -> Option<ScenarioId> {
        self.conquered.last().copied()
    }

    #[must_use]
    pub fn conquered_order(&self) -> &[ScenarioId] {
        &self.conquered
    }

    #[must_use]
    pub fn conquered_scenarios(&self) -> BTreeSet<ScenarioId> {
        self.conquered.iter().copied().collect()
    }

    #[must_use]
    pub fn is_conquered(&self, scenario: ScenarioId) -> bool {
        self.conquered.contains(&scenario)
    }

    #[must_use]
    pub fn is_available(&self, graph: &CampaignGraph, scenario: ScenarioId) -> bool {
        graph.is_available(scenario, &self.conquered)
    }

    #[must_use]
    pub fn is_campaign_finished(&self, graph: &CampaignGraph) -> bool {
        graph.is_finished(&self.conquered)
    }

    #[must_use]
    pub fn bonus_id(&self, scenario: ScenarioId) -> Option<u8> {
        self.chosen_bonus.get(&scenario).copied()
    }

    /// Status of `scenario`; unknown ids report `Locked`.
    #[must_use]
    pub fn scenario_status(&self, graph: &CampaignGraph, scenario: ScenarioId) -> ScenarioStatus {
        if self.is_conquered(scenario) {
            ScenarioStatus::Conquered
        } else if self.current == Some(scenario) {
            ScenarioStatus::InProgress
        } else if self.is_available(graph, scenario) {
            ScenarioStatus::Available
        } else {
            ScenarioStatus::Locked
        }
    }

    pub fn reset(&mut self) {
        self.conquered.clear();
        self.current = None;
        self.chosen_bonus.clear();
    }
}
