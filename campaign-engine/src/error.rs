//! Error taxonomy shared by every campaign component.

use thiserror::Error;

use crate::ids::{HeroId, ScenarioId};

/// Errors raised by the campaign graph, the progress state machine, the
/// crossover ledger and the save format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CampaignError {
    #[error("malformed campaign graph: {reason}")]
    MalformedGraph { reason: String },
    #[error("scenario {0} is not available")]
    NotAvailable(ScenarioId),
    #[error("scenario {current} is already in progress")]
    AlreadyInProgress { current: ScenarioId },
    #[error("no scenario is in progress")]
    NoActiveScenario,
    #[error("scenario {scenario} has no bonus at index {index} ({available} choosable)")]
    InvalidBonusIndex {
        scenario: ScenarioId,
        index: u8,
        available: usize,
    },
    #[error("hero {hero} is not eligible to travel into scenario {scenario}")]
    HeroNotEligible { scenario: ScenarioId, hero: HeroId },
    #[error("hero {hero} is already placed in scenario {scenario}")]
    HeroAlreadyPlaced { scenario: ScenarioId, hero: HeroId },
    #[error("crossover heroes for scenario {0} were already recorded")]
    CrossoverAlreadyRecorded(ScenarioId),
    #[error("scenario {0} is not the scenario in progress")]
    ScenarioNotInProgress(ScenarioId),
    #[error("unknown scenario {0}")]
    UnknownScenario(ScenarioId),
    #[error("no map data stored for scenario {0}")]
    MissingMapData(ScenarioId),
    #[error("unsupported save format version {found} (supported {min}..={max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },
    #[error("corrupt save data: {0}")]
    Format(String),
    #[error("invalid campaign definition: {0}")]
    Definition(String),
}

impl CampaignError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGraph {
            reason: reason.into(),
        }
    }

    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format(reason.into())
    }
}

impl From<serde_json::Error> for CampaignError {
    fn from(err: serde_json::Error) -> Self {
        Self::Definition(err.to_string())
    }
}

impl From<bincode::Error> for CampaignError {
    fn from(err: bincode::Error) -> Self {
        Self::Format(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_ids() {
        let err = CampaignError::InvalidBonusIndex {
            scenario: ScenarioId(2),
            index: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "scenario 2 has no bonus at index 5 (3 choosable)"
        );
        let err = CampaignError::UnsupportedVersion {
            found: 9,
            min: 1,
            max: 3,
        };
        assert!(err.to_string().contains("version 9"));
    }

    #[test]
    fn json_errors_map_to_definition_errors() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        assert!(matches!(CampaignError::from(err), CampaignError::Definition(_)));
    }
}
