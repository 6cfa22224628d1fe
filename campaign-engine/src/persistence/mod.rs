//! Versioned binary save format for [`CampaignState`].
//!
//! Layout: magic, format version, campaign header, scenario graph, then the
//! player's progress (crossover ledger, mission blobs, conquered list,
//! current scenario, chosen bonuses). Readers accept any version between
//! [`MINIMUM_FORMAT`] and [`CURRENT_FORMAT`] and default the fields an older
//! stream lacks.
mod codec;
mod records;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use codec::{SaveReader, SaveWriter, Versioned};

use crate::crossover::CrossoverLedger;
use crate::definition::CampaignDefinition;
use crate::error::CampaignError;
use crate::graph::CampaignGraph;
use crate::ids::ScenarioId;
use crate::progress::ProgressTracker;
use crate::state::CampaignState;
use records::{HeaderRecord, ScenarioRecord, load_keyed, save_keyed};

pub const SAVE_MAGIC: [u8; 4] = *b"CMPN";

/// Initial layout.
pub const FORMAT_INITIAL: u32 = 1;
/// Adds mod name and text encoding to the header and placed crossover heroes.
pub const FORMAT_PLACED_HEROES: u32 = 2;
/// Adds hero armies to crossover records and the bonus player color.
pub const FORMAT_HERO_ARMIES: u32 = 3;

pub const MINIMUM_FORMAT: u32 = FORMAT_INITIAL;
pub const CURRENT_FORMAT: u32 = FORMAT_HERO_ARMIES;

/// Encode a campaign state in the current format.
///
/// # Errors
///
/// Returns `Format` if a value cannot be encoded.
pub fn serialize(state: &CampaignState) -> Result<Vec<u8>, CampaignError> {
    serialize_with_version(state, CURRENT_FORMAT)
}

/// Encode a campaign state for readers of an older format. Fields the older
/// format lacks are dropped.
///
/// # Errors
///
/// Returns `UnsupportedVersion` for versions outside the supported range.
pub fn serialize_with_version(
    state: &CampaignState,
    version: u32,
) -> Result<Vec<u8>, CampaignError> {
    check_version(version)?;
    let mut w = SaveWriter::new(version);
    w.raw(&SAVE_MAGIC);
    w.put(&version)?;

    let definition = state.definition();
    let graph = definition.graph();
    HeaderRecord {
        header: definition.header().clone(),
        scenario_count: u32::try_from(graph.scenario_count())
            .map_err(|_| CampaignError::format("too many scenarios"))?,
    }
    .save(&mut w)?;
    for (id, scenario) in graph.iter() {
        ScenarioRecord(id, scenario.clone()).save(&mut w)?;
    }

    let ledger = state.crossover();
    save_keyed(&mut w, ledger.crossover_map())?;
    if w.has(FORMAT_PLACED_HEROES) {
        save_keyed(&mut w, ledger.placed_map())?;
    }
    w.put(state.map_blobs())?;
    w.put(state.conquered_order())?;
    w.put(&state.current_scenario())?;
    w.put(state.progress().chosen_bonuses())?;

    log::debug!(
        "serialized campaign '{}' as format {version}",
        definition.name()
    );
    Ok(w.into_bytes())
}

/// Decode a campaign state. Either the whole state is restored or an error
/// is returned.
///
/// # Errors
///
/// Returns `UnsupportedVersion` for unknown format or hero record versions
/// and `Format` for corrupt data or restored progress that violates campaign
/// invariants.
pub fn deserialize(bytes: &[u8]) -> Result<CampaignState, CampaignError> {
    let mut r = SaveReader::new(bytes, MINIMUM_FORMAT);
    if r.raw(SAVE_MAGIC.len())? != SAVE_MAGIC {
        return Err(CampaignError::format("not a campaign save"));
    }
    let version: u32 = r.take()?;
    check_version(version)?;
    r.set_version(version);

    let HeaderRecord {
        header,
        scenario_count,
    } = HeaderRecord::load(&mut r)?;
    let mut scenarios = Vec::new();
    for _ in 0..scenario_count {
        let ScenarioRecord(id, scenario) = ScenarioRecord::load(&mut r)?;
        scenarios.push((id, scenario));
    }
    let graph = CampaignGraph::new(scenarios)
        .map_err(|err| CampaignError::format(format!("stored graph invalid: {err}")))?;
    let definition = Arc::new(CampaignDefinition::new(header, graph));

    let crossover = load_keyed(&mut r)?;
    let placed = if r.has(FORMAT_PLACED_HEROES) {
        load_keyed(&mut r)?
    } else {
        BTreeMap::new()
    };
    let map_blobs: BTreeMap<ScenarioId, Vec<u8>> = r.take()?;
    let conquered: Vec<ScenarioId> = r.take()?;
    let current: Option<ScenarioId> = r.take()?;
    let chosen_bonus: BTreeMap<ScenarioId, u8> = r.take()?;

    if r.remaining() > 0 {
        log::warn!(
            "ignoring {} trailing bytes after format {version} campaign save",
            r.remaining()
        );
    }

    CampaignState::restore(
        definition,
        map_blobs,
        ProgressTracker::from_parts(conquered, current, chosen_bonus),
        CrossoverLedger::from_parts(crossover, placed),
    )
}

fn check_version(version: u32) -> Result<(), CampaignError> {
    if version < MINIMUM_FORMAT || version > CURRENT_FORMAT {
        return Err(CampaignError::UnsupportedVersion {
            found: version,
            min: MINIMUM_FORMAT,
            max: CURRENT_FORMAT,
        });
    }
    Ok(())
}
