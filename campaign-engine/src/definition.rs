//! Read-only campaign definition: header metadata, scenario graph and bonus catalog.
use serde::{Deserialize, Serialize};

use crate::bonus::BonusCatalog;
use crate::error::CampaignError;
use crate::graph::{CampaignGraph, Scenario};
use crate::ids::ScenarioId;

/// Encoding family the campaign was authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    #[default]
    Unified,
    /// Pre-unification binary campaign, by revision byte.
    Legacy { revision: u8 },
}

impl SourceFormat {
    const UNIFIED_CODE: u8 = 1;

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unified => Self::UNIFIED_CODE,
            Self::Legacy { revision } => revision,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        if code == Self::UNIFIED_CODE {
            Self::Unified
        } else {
            Self::Legacy { revision: code }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegionDescription {
    pub infix: String,
    pub x: i32,
    pub y: i32,
}

/// Background-map layout of the campaign's regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CampaignRegions {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub color_suffix_length: i32,
    #[serde(default)]
    pub regions: Vec<RegionDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CampaignHeader {
    #[serde(default)]
    pub format: SourceFormat,
    #[serde(default)]
    pub regions: CampaignRegions,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty_chosen_by_player: bool,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub mod_name: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

pub(crate) fn default_encoding() -> String {
    "utf-8".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct ScenarioEntry {
    id: ScenarioId,
    #[serde(flatten)]
    scenario: Scenario,
}

#[derive(Debug, Clone, Deserialize)]
struct CampaignDocument {
    #[serde(flatten)]
    header: CampaignHeader,
    scenarios: Vec<ScenarioEntry>,
}

/// Everything about a campaign that does not change while it is played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDefinition {
    header: CampaignHeader,
    graph: CampaignGraph,
    catalog: BonusCatalog,
}

impl CampaignDefinition {
    #[must_use]
    pub fn new(header: CampaignHeader, graph: CampaignGraph) -> Self {
        let catalog = BonusCatalog::from_graph(&graph);
        Self {
            header,
            graph,
            catalog,
        }
    }

    /// Parse a campaign document.
    ///
    /// # Errors
    ///
    /// Returns `Definition` for malformed JSON and `MalformedGraph` when the
    /// scenarios do not form a valid graph.
    pub fn from_json(json: &str) -> Result<Self, CampaignError> {
        let document: CampaignDocument = serde_json::from_str(json)?;
        let graph = CampaignGraph::new(
            document
                .scenarios
                .into_iter()
                .map(|entry| (entry.id, entry.scenario)),
        )?;
        Ok(Self::new(document.header, graph))
    }

    #[must_use]
    pub const fn header(&self) -> &CampaignHeader {
        &self.header
    }

    #[must_use]
    pub const fn graph(&self) -> &CampaignGraph {
        &self.graph
    }

    #[must_use]
    pub const fn catalog(&self) -> &BonusCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    #[must_use]
    pub fn scenario(&self, id: ScenarioId) -> Option<&Scenario> {
        self.graph.scenario(id)
    }

    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.graph.scenario_count()
    }
}

/// Converts pre-unification campaign files into a current definition.
/// Implementations live outside the core.
pub trait LegacyImporter {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode a legacy campaign file.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a campaign this importer understands.
    fn import(&self, filename: &str, bytes: &[u8]) -> Result<CampaignDefinition, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::{Bonus, StartMode};

    const DOCUMENT: &str = r#"{
        "name": "Long Live the Queen",
        "description": "Three kingdoms",
        "difficulty_chosen_by_player": true,
        "regions": { "prefix": "CAMPA", "regions": [{ "infix": "A", "x": 10, "y": 20 }] },
        "scenarios": [
            { "id": 0, "map_name": "q1.map" },
            {
                "id": 1,
                "map_name": "q2.map",
                "preconditions": [0],
                "travel": {
                    "start_mode": "choose_bonus",
                    "bonuses": [{ "kind": "resource", "resource": 6, "amount": 2000 }]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_document_into_graph_and_catalog() {
        let definition = CampaignDefinition::from_json(DOCUMENT).unwrap();
        assert_eq!(definition.name(), "Long Live the Queen");
        assert_eq!(definition.scenario_count(), 2);
        assert_eq!(definition.header().encoding, "utf-8");
        assert_eq!(definition.header().format, SourceFormat::Unified);
        assert_eq!(definition.header().regions.regions[0].x, 10);
        assert_eq!(
            definition.catalog().start_mode(ScenarioId(1)),
            StartMode::ChooseBonus
        );
        assert_eq!(
            definition.catalog().resolve(ScenarioId(1), 0).unwrap(),
            Bonus::Resource {
                resource: 6,
                amount: 2000
            }
        );
    }

    #[test]
    fn cyclic_documents_fail_as_malformed_graphs() {
        let json = r#"{ "name": "loop", "scenarios": [
            { "id": 0, "map_name": "a", "preconditions": [1] },
            { "id": 1, "map_name": "b", "preconditions": [0] }
        ] }"#;
        assert!(matches!(
            CampaignDefinition::from_json(json),
            Err(CampaignError::MalformedGraph { .. })
        ));
        assert!(matches!(
            CampaignDefinition::from_json("{"),
            Err(CampaignError::Definition(_))
        ));
    }

    #[test]
    fn source_format_codes() {
        assert_eq!(SourceFormat::from_code(1), SourceFormat::Unified);
        assert_eq!(
            SourceFormat::from_code(6),
            SourceFormat::Legacy { revision: 6 }
        );
        assert_eq!(SourceFormat::Legacy { revision: 4 }.code(), 4);
    }
}
