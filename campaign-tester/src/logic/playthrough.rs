use anyhow::{Context, Result};
use campaign_engine::{
    CampaignEngine, CampaignState, HeroId, HeroInstance, HeroSnapshot, Placement, PlayerColor,
    ScenarioId,
};
use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt::Write as _;

use super::campaign::{CampaignFiles, SlotStorage};

const AUTOSAVE_SLOT: &str = "autosave";
const RECRUIT_ID_BASE: u32 = 1_000;

/// How the simulated player picks the next scenario and its heroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PlayStrategy {
    /// Lowest ready scenario first, every eligible hero placed
    Ordered,
    /// Any ready scenario, a random subset of heroes placed
    Random,
}

impl PlayStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Random => "random",
        }
    }
}

/// What happened in one scenario of a playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub scenario: ScenarioId,
    pub bonus: Option<u8>,
    pub eligible_heroes: usize,
    pub placed: usize,
    pub lost: usize,
    pub survivors: usize,
    pub save_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct PlaythroughSummary {
    pub seed: u64,
    pub strategy: PlayStrategy,
    pub steps: Vec<StepRecord>,
    /// Progress or crossover rules observed to be broken.
    pub violations: Vec<String>,
    /// Autosaves that did not load back identically.
    pub restore_failures: Vec<String>,
    pub finished: bool,
    /// SHA-256 of the final save, hex encoded.
    pub digest: String,
    pub final_state: CampaignState,
}

impl PlaythroughSummary {
    pub fn conquered_order(&self) -> Vec<ScenarioId> {
        self.steps.iter().map(|step| step.scenario).collect()
    }
}

/// Drives whole playthroughs of one campaign through the engine.
pub struct CampaignSimulator {
    engine: CampaignEngine<CampaignFiles, SlotStorage>,
    fresh: CampaignState,
    verbose: bool,
}

impl CampaignSimulator {
    /// Load `campaign` (a document path, or the bundled sample).
    pub fn new(campaign: &str, verbose: bool) -> Result<Self> {
        let engine = CampaignEngine::new(CampaignFiles, SlotStorage::default());
        let fresh = engine
            .start_campaign(campaign)
            .with_context(|| format!("failed to start campaign {campaign}"))?;
        Ok(Self {
            engine,
            fresh,
            verbose,
        })
    }

    pub fn campaign_name(&self) -> &str {
        self.fresh.definition().name()
    }

    pub fn scenario_count(&self) -> usize {
        self.fresh.graph().scenario_count()
    }

    pub const fn fresh_state(&self) -> &CampaignState {
        &self.fresh
    }

    pub fn run(&self, strategy: PlayStrategy, seed: u64) -> Result<PlaythroughSummary> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut state = self.fresh.clone();
        let mut steps = Vec::new();
        let mut violations = Vec::new();
        let mut restore_failures = Vec::new();
        let mut next_recruit = RECRUIT_ID_BASE;

        while !state.is_campaign_finished() {
            check_availability(&state, &mut violations);
            let Some(next) = pick_scenario(&state, strategy, &mut rng) else {
                violations.push(format!(
                    "no scenario available after {:?}",
                    state.conquered_order()
                ));
                break;
            };
            state.set_current_map(next)?;

            let choosable = state.definition().catalog().choosable(next).len();
            if choosable > 0 {
                let index = u8::try_from(rng.gen_range(0..choosable))?;
                state.set_current_map_bonus(index)?;
            }

            let eligible = state.heroes_available_for(next);
            let placements = pick_placements(&eligible, strategy, &mut rng);
            state.place_heroes(next, &placements)?;
            let lost = state.lost_crossover_heroes(next);
            check_partition(&state, next, &eligible, &lost, &mut violations);

            let save_bytes = self.round_trip(&state, &mut restore_failures)?;

            let survivors = finish_scenario(&state, next, &mut rng, &mut next_recruit);
            let before = state.conquered_scenarios();
            state.set_current_map_as_conquered(&survivors)?;
            if !before.is_subset(&state.conquered_scenarios()) {
                violations.push(format!("conquest of scenario {next} dropped earlier conquests"));
            }

            if self.verbose {
                log::info!(
                    "seed {seed}: scenario {next} conquered ({} eligible, {} placed, {} survivors)",
                    eligible.len(),
                    placements.len(),
                    survivors.len()
                );
            }

            steps.push(StepRecord {
                scenario: next,
                bonus: state.bonus_id(next),
                eligible_heroes: eligible.len(),
                placed: placements.len(),
                lost: lost.len(),
                survivors: survivors.len(),
                save_bytes,
            });
        }

        let final_bytes = campaign_engine::serialize(&state)?;
        Ok(PlaythroughSummary {
            seed,
            strategy,
            steps,
            violations,
            restore_failures,
            finished: state.is_campaign_finished(),
            digest: hex_digest(&final_bytes),
            final_state: state,
        })
    }

    /// Save through the engine's slot storage and compare what comes back.
    fn round_trip(&self, state: &CampaignState, failures: &mut Vec<String>) -> Result<usize> {
        self.engine.save_campaign(AUTOSAVE_SLOT, state)?;
        let restored = self.engine.load_campaign(AUTOSAVE_SLOT)?;
        if restored.as_ref() != Some(state) {
            failures.push(format!(
                "save taken during scenario {:?} did not restore identically",
                state.current_scenario()
            ));
        }
        Ok(self
            .engine
            .storage()
            .slot_size(AUTOSAVE_SLOT)
            .unwrap_or_default())
    }
}

fn pick_scenario(
    state: &CampaignState,
    strategy: PlayStrategy,
    rng: &mut ChaCha20Rng,
) -> Option<ScenarioId> {
    let available = state.available_scenarios();
    match strategy {
        PlayStrategy::Ordered => available.first().copied(),
        PlayStrategy::Random => available.choose(rng).copied(),
    }
}

fn pick_placements(
    eligible: &[HeroSnapshot],
    strategy: PlayStrategy,
    rng: &mut ChaCha20Rng,
) -> Vec<Placement> {
    eligible
        .iter()
        .filter(|_| matches!(strategy, PlayStrategy::Ordered) || rng.gen_bool(0.6))
        .zip(0_u8..)
        .map(|(hero, placeholder)| Placement {
            hero: hero.id,
            placeholder,
        })
        .collect()
}

/// Heroes that finish the scenario: placed heroes that survive, grown a
/// little, plus the odd new recruit.
fn finish_scenario(
    state: &CampaignState,
    scenario: ScenarioId,
    rng: &mut ChaCha20Rng,
    next_recruit: &mut u32,
) -> Vec<HeroInstance> {
    let mut heroes = Vec::new();
    for placed in state.placed_heroes(scenario) {
        if rng.gen_bool(0.8) {
            heroes.push(grow(&placed.hero, rng));
        }
    }

    let recruits = rng.gen_range(0..=2);
    for _ in 0..recruits {
        let id = HeroId(*next_recruit);
        *next_recruit += 1;
        heroes.push(recruit(id, rng));
    }
    heroes
}

fn grow(snapshot: &HeroSnapshot, rng: &mut ChaCha20Rng) -> HeroInstance {
    let mut primary = snapshot.primary.unwrap_or_default();
    primary.attack += rng.gen_range(0..3);
    primary.defense += rng.gen_range(0..3);
    let mut artifacts = snapshot.artifacts.clone();
    if rng.gen_bool(0.3) {
        artifacts.push(rng.gen_range(0..100));
    }
    HeroInstance {
        id: snapshot.id,
        owner: snapshot.owner,
        name: snapshot.name.clone(),
        experience: snapshot.experience.unwrap_or(0) + rng.gen_range(500..5_000),
        primary,
        secondary: snapshot.secondary.clone(),
        spells: snapshot.spells.clone(),
        artifacts,
        army: snapshot.army.clone(),
    }
}

fn recruit(id: HeroId, rng: &mut ChaCha20Rng) -> HeroInstance {
    let mut hero = HeroInstance {
        id,
        owner: PlayerColor(0),
        name: format!("recruit-{}", id.0),
        experience: rng.gen_range(0..2_000),
        ..HeroInstance::default()
    };
    hero.primary.attack = rng.gen_range(0..5);
    hero.primary.knowledge = rng.gen_range(0..5);
    hero.spells = (0..8).filter(|_| rng.gen_bool(0.2)).collect();
    hero.artifacts = (0..100).filter(|_| rng.gen_bool(0.03)).collect();
    hero
}

fn check_availability(state: &CampaignState, violations: &mut Vec<String>) {
    let conquered = state.conquered_scenarios();
    for (id, scenario) in state.graph().iter() {
        let expected = !conquered.contains(&id) && scenario.preconditions.is_subset(&conquered);
        if state.is_available(id) != expected {
            violations.push(format!(
                "scenario {id} availability is {} with conquered {conquered:?}",
                state.is_available(id)
            ));
        }
    }
}

fn check_partition(
    state: &CampaignState,
    scenario: ScenarioId,
    eligible: &[HeroSnapshot],
    lost: &[HeroSnapshot],
    violations: &mut Vec<String>,
) {
    let eligible: BTreeSet<HeroId> = eligible.iter().map(|hero| hero.id).collect();
    let lost: BTreeSet<HeroId> = lost.iter().map(|hero| hero.id).collect();
    let placed: BTreeSet<HeroId> = state
        .placed_heroes(scenario)
        .iter()
        .map(|placed| placed.hero.id)
        .collect();
    let union: BTreeSet<HeroId> = placed.union(&lost).copied().collect();
    if !placed.is_disjoint(&lost) || union != eligible {
        violations.push(format!(
            "scenario {scenario}: placed {placed:?} and lost {lost:?} do not partition {eligible:?}"
        ));
    }
}

pub fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}
