use campaign_engine::{
    CampaignDefinition, CampaignError, CampaignStorage, DefinitionLoader, Scenario,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Name that selects the campaign shipped with the tester.
pub const BUNDLED_CAMPAIGN: &str = "bundled";

const BUNDLED_DOCUMENT: &str = include_str!("../../../assets/campaigns/sample.json");

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read campaign {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Campaign(#[from] CampaignError),
}

/// Loads campaign documents from disk, or the bundled sample.
///
/// The tester never decodes maps, so each scenario's mission bytes are a
/// stand-in derived from its map name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CampaignFiles;

impl DefinitionLoader for CampaignFiles {
    type Error = LoadError;

    fn load_definition(&self, campaign: &str) -> Result<CampaignDefinition, Self::Error> {
        if campaign == BUNDLED_CAMPAIGN {
            return Ok(CampaignDefinition::from_json(BUNDLED_DOCUMENT)?);
        }
        let path = PathBuf::from(campaign);
        let json = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(CampaignDefinition::from_json(&json)?)
    }

    fn load_map_data(&self, _campaign: &str, scenario: &Scenario) -> Result<Vec<u8>, Self::Error> {
        Ok(scenario.map_name.as_bytes().to_vec())
    }
}

/// Save slots kept in memory for the duration of a run.
#[derive(Debug, Default)]
pub struct SlotStorage {
    slots: RefCell<HashMap<String, Vec<u8>>>,
}

impl SlotStorage {
    pub fn slot_size(&self, slot: &str) -> Option<usize> {
        self.slots.borrow().get(slot).map(Vec::len)
    }
}

impl CampaignStorage for SlotStorage {
    type Error = Infallible;

    fn save_bytes(&self, slot: &str, bytes: &[u8]) -> Result<(), Self::Error> {
        self.slots
            .borrow_mut()
            .insert(slot.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load_bytes(&self, slot: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.slots.borrow().get(slot).cloned())
    }

    fn delete_save(&self, slot: &str) -> Result<(), Self::Error> {
        self.slots.borrow_mut().remove(slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_campaign_parses() {
        let definition = CampaignFiles.load_definition(BUNDLED_CAMPAIGN).unwrap();
        assert_eq!(definition.name(), "Crown of the Marches");
        assert_eq!(definition.scenario_count(), 4);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CampaignFiles
            .load_definition("/nonexistent/campaign.json")
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/campaign.json"));
    }

    #[test]
    fn slots_round_trip() {
        let storage = SlotStorage::default();
        storage.save_bytes("a", &[1, 2, 3]).unwrap();
        assert_eq!(storage.slot_size("a"), Some(3));
        assert_eq!(storage.load_bytes("a").unwrap(), Some(vec![1, 2, 3]));
        storage.delete_save("a").unwrap();
        assert_eq!(storage.load_bytes("a").unwrap(), None);
    }
}
