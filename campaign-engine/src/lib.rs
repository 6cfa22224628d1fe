//! Campaign Engine
//!
//! Platform-agnostic campaign progression for multi-scenario strategy
//! campaigns: the scenario precondition graph, starting bonus selection,
//! hero crossover between scenarios and the versioned save format.
//! Loading files, decoding maps and presenting choices are left to the host.

pub mod bonus;
pub mod crossover;
pub mod definition;
pub mod error;
pub mod graph;
pub mod hero;
pub mod ids;
pub mod persistence;
pub mod progress;
pub mod state;

// Re-export commonly used types
pub use bonus::{Bonus, BonusCatalog, StartMode};
pub use crossover::{CrossoverLedger, PlacedHero, Placement};
pub use definition::{
    CampaignDefinition, CampaignHeader, CampaignRegions, LegacyImporter, RegionDescription,
    SourceFormat,
};
pub use error::CampaignError;
pub use graph::{CampaignGraph, HeroKeeps, Narrative, Scenario, TravelRules};
pub use hero::{
    Army, ArmyStack, HERO_RECORD_VERSION, HeroInstance, HeroSnapshot, PrimarySkills,
    SecondarySkill,
};
pub use ids::{ArtifactId, CreatureId, HeroId, PlayerColor, ScenarioId, SkillId, SpellId};
pub use persistence::{CURRENT_FORMAT, MINIMUM_FORMAT, deserialize, serialize};
pub use progress::{ProgressTracker, ScenarioStatus};
pub use state::CampaignState;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Trait for abstracting campaign definition and mission data loading
/// Platform-specific implementations should provide this
pub trait DefinitionLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the definition of a campaign by name
    ///
    /// # Errors
    ///
    /// Returns an error if the definition cannot be found or parsed.
    fn load_definition(&self, campaign: &str) -> Result<CampaignDefinition, Self::Error>;

    /// Load the raw mission bytes referenced by a scenario
    ///
    /// # Errors
    ///
    /// Returns an error if the map data cannot be read.
    fn load_map_data(&self, campaign: &str, scenario: &Scenario) -> Result<Vec<u8>, Self::Error>;
}

/// Decodes stored mission bytes into a playable map.
/// The engine never looks inside the bytes itself.
pub trait MapDecoder {
    type Map;
    type Error: std::error::Error + Send + Sync + 'static;

    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid map.
    fn decode(&self, scenario: ScenarioId, bytes: &[u8]) -> Result<Self::Map, Self::Error>;
}

/// Trait for abstracting save slot operations
/// Platform-specific implementations should provide this
pub trait CampaignStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store an encoded campaign save
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be written.
    fn save_bytes(&self, slot: &str, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read an encoded campaign save
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read.
    fn load_bytes(&self, slot: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Delete a saved campaign
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    fn delete_save(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Main entry point binding a definition loader to save storage
pub struct CampaignEngine<L, S>
where
    L: DefinitionLoader,
    S: CampaignStorage,
{
    loader: L,
    storage: S,
}

impl<L, S> CampaignEngine<L, S>
where
    L: DefinitionLoader,
    S: CampaignStorage,
    L::Error: Into<anyhow::Error>,
    S::Error: Into<anyhow::Error>,
{
    /// Create a new engine with the provided loader and storage
    pub const fn new(loader: L, storage: S) -> Self {
        Self { loader, storage }
    }

    pub const fn loader(&self) -> &L {
        &self.loader
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a fresh playthrough of the named campaign
    ///
    /// # Errors
    ///
    /// Returns an error if the definition or any scenario's map data cannot be loaded.
    pub fn start_campaign(&self, campaign: &str) -> anyhow::Result<CampaignState> {
        let definition = self.loader.load_definition(campaign).map_err(Into::into)?;
        let mut blobs = BTreeMap::new();
        for (id, scenario) in definition.graph().iter() {
            let bytes = self
                .loader
                .load_map_data(campaign, scenario)
                .map_err(Into::into)?;
            blobs.insert(id, bytes);
        }
        log::info!(
            "starting campaign '{}' with {} scenarios",
            definition.name(),
            definition.scenario_count()
        );
        Ok(CampaignState::new(Arc::new(definition), blobs)?)
    }

    /// Save a campaign state into a slot
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be encoded or stored.
    pub fn save_campaign(&self, slot: &str, state: &CampaignState) -> anyhow::Result<()> {
        let bytes = serialize(state)?;
        self.storage.save_bytes(slot, &bytes).map_err(Into::into)
    }

    /// Load a campaign state from a slot
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be read or holds an invalid save.
    pub fn load_campaign(&self, slot: &str) -> anyhow::Result<Option<CampaignState>> {
        match self.storage.load_bytes(slot).map_err(Into::into)? {
            Some(bytes) => Ok(Some(deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete a saved campaign
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be deleted.
    pub fn delete_campaign(&self, slot: &str) -> anyhow::Result<()> {
        self.storage.delete_save(slot).map_err(Into::into)
    }
}
