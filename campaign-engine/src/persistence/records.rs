//! Binary layouts of the campaign's structural types.
use std::collections::BTreeMap;

use super::codec::{SaveReader, SaveWriter, Versioned};
use super::{FORMAT_HERO_ARMIES, FORMAT_PLACED_HEROES};
use crate::bonus::{Bonus, StartMode};
use crate::crossover::PlacedHero;
use crate::definition::{CampaignHeader, CampaignRegions, SourceFormat, default_encoding};
use crate::error::CampaignError;
use crate::graph::{Scenario, TravelRules};
use crate::hero::{Army, HeroSnapshot, check_record_version};
use crate::ids::{HeroId, PlayerColor, ScenarioId};

/// Header fields followed by the number of scenarios that come after it.
pub(super) struct HeaderRecord {
    pub header: CampaignHeader,
    pub scenario_count: u32,
}

impl Versioned for HeaderRecord {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        let header = &self.header;
        w.put(&header.format.code())?;
        header.regions.save(w)?;
        w.put(&self.scenario_count)?;
        w.put(&header.name)?;
        w.put(&header.description)?;
        w.put(&header.difficulty_chosen_by_player)?;
        w.put(&header.filename)?;
        if w.has(FORMAT_PLACED_HEROES) {
            w.put(&header.mod_name)?;
            w.put(&header.encoding)?;
        }
        Ok(())
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        let format = SourceFormat::from_code(r.take()?);
        let regions = CampaignRegions::load(r)?;
        let scenario_count = r.take()?;
        let name = r.take()?;
        let description = r.take()?;
        let difficulty_chosen_by_player = r.take()?;
        let filename = r.take()?;
        let (mod_name, encoding) = if r.has(FORMAT_PLACED_HEROES) {
            (r.take()?, r.take()?)
        } else {
            (String::new(), default_encoding())
        };
        Ok(Self {
            header: CampaignHeader {
                format,
                regions,
                name,
                description,
                difficulty_chosen_by_player,
                filename,
                mod_name,
                encoding,
            },
            scenario_count,
        })
    }
}

impl Versioned for CampaignRegions {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        w.put(&self.prefix)?;
        w.put(&self.color_suffix_length)?;
        w.put(&self.regions)
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        Ok(Self {
            prefix: r.take()?,
            color_suffix_length: r.take()?,
            regions: r.take()?,
        })
    }
}

impl Versioned for Bonus {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        w.put(&self.kind_code())?;
        w.put(&self.params())
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        let kind: u8 = r.take()?;
        let params: [i32; 3] = r.take()?;
        Self::from_parts(kind, params)
            .ok_or_else(|| CampaignError::format(format!("unknown bonus kind {kind}")))
    }
}

impl Versioned for TravelRules {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        w.put(&self.keeps)?;
        w.put(&self.monsters_kept)?;
        w.put(&self.artifacts_kept)?;
        w.put(&self.start_mode.code())?;
        if w.has(FORMAT_HERO_ARMIES) {
            w.put(&self.player_color.0)?;
        }
        w.put_seq(&self.bonuses)
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        let keeps = r.take()?;
        let monsters_kept = r.take()?;
        let artifacts_kept = r.take()?;
        let mode: u8 = r.take()?;
        let start_mode = StartMode::from_code(mode)
            .ok_or_else(|| CampaignError::format(format!("unknown start mode {mode}")))?;
        let player_color = if r.has(FORMAT_HERO_ARMIES) {
            PlayerColor(r.take()?)
        } else {
            PlayerColor::NEUTRAL
        };
        let bonuses = r.take_seq()?;
        Ok(Self {
            keeps,
            monsters_kept,
            artifacts_kept,
            bonuses,
            start_mode,
            player_color,
        })
    }
}

impl Versioned for Scenario {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        w.put(&self.map_name)?;
        w.put(&self.scenario_name)?;
        w.put(&self.preconditions)?;
        w.put(&self.region_color)?;
        w.put(&self.difficulty)?;
        w.put(&self.region_text)?;
        w.put(&self.prolog)?;
        w.put(&self.epilog)?;
        self.travel.save(w)
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        Ok(Self {
            map_name: r.take()?,
            scenario_name: r.take()?,
            preconditions: r.take()?,
            region_color: r.take()?,
            difficulty: r.take()?,
            region_text: r.take()?,
            prolog: r.take()?,
            epilog: r.take()?,
            travel: TravelRules::load(r)?,
        })
    }
}

/// A scenario together with its id.
pub(super) struct ScenarioRecord(pub ScenarioId, pub Scenario);

impl Versioned for ScenarioRecord {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        w.put(&self.0)?;
        self.1.save(w)
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        let id = r.take()?;
        Ok(Self(id, Scenario::load(r)?))
    }
}

impl Versioned for HeroSnapshot {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        w.put(&self.record_version)?;
        w.put(&self.id.0)?;
        w.put(&self.owner.0)?;
        w.put(&self.name)?;
        w.put(&self.experience)?;
        w.put(&self.primary)?;
        w.put(&self.secondary)?;
        w.put(&self.spells)?;
        w.put(&self.artifacts)?;
        if w.has(FORMAT_HERO_ARMIES) {
            w.put(&self.army)?;
        }
        Ok(())
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        let record_version: u16 = r.take()?;
        check_record_version(record_version)?;
        Ok(Self {
            record_version,
            id: HeroId(r.take()?),
            owner: PlayerColor(r.take()?),
            name: r.take()?,
            experience: r.take()?,
            primary: r.take()?,
            secondary: r.take()?,
            spells: r.take()?,
            artifacts: r.take()?,
            army: if r.has(FORMAT_HERO_ARMIES) {
                r.take()?
            } else {
                Army::new()
            },
        })
    }
}

impl Versioned for PlacedHero {
    fn save(&self, w: &mut SaveWriter) -> Result<(), CampaignError> {
        w.put(&self.placeholder)?;
        self.hero.save(w)
    }

    fn load(r: &mut SaveReader<'_>) -> Result<Self, CampaignError> {
        Ok(Self {
            placeholder: r.take()?,
            hero: HeroSnapshot::load(r)?,
        })
    }
}

/// Per-scenario lists, keyed by scenario id.
pub(super) fn save_keyed<T: Versioned>(
    w: &mut SaveWriter,
    map: &BTreeMap<ScenarioId, Vec<T>>,
) -> Result<(), CampaignError> {
    let len = u32::try_from(map.len()).map_err(|_| CampaignError::format("too many entries"))?;
    w.put(&len)?;
    for (id, items) in map {
        w.put(id)?;
        w.put_seq(items)?;
    }
    Ok(())
}

pub(super) fn load_keyed<T: Versioned>(
    r: &mut SaveReader<'_>,
) -> Result<BTreeMap<ScenarioId, Vec<T>>, CampaignError> {
    let len: u32 = r.take()?;
    let mut map = BTreeMap::new();
    for _ in 0..len {
        let id: ScenarioId = r.take()?;
        let items = r.take_seq()?;
        if map.insert(id, items).is_some() {
            return Err(CampaignError::format(format!(
                "scenario {id} listed twice"
            )));
        }
    }
    Ok(map)
}
