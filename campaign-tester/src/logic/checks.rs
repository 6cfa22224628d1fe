use anyhow::{Result, ensure};
use campaign_engine::persistence::{MINIMUM_FORMAT, serialize_with_version};
use campaign_engine::{ScenarioId, deserialize};
use std::collections::BTreeSet;

use super::playthrough::{CampaignSimulator, PlaythroughSummary};

/// Inputs a check may inspect after one playthrough.
pub struct CheckContext<'a> {
    pub simulator: &'a CampaignSimulator,
    pub summary: &'a PlaythroughSummary,
}

type Expectation = fn(&CheckContext<'_>) -> Result<()>;

/// A named property asserted after every playthrough.
#[derive(Clone, Copy)]
pub struct CampaignCheck {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    expectation: Expectation,
}

impl CampaignCheck {
    const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        expectation: Expectation,
    ) -> Self {
        Self {
            key,
            name,
            description,
            expectation,
        }
    }

    pub fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<()> {
        (self.expectation)(ctx)
    }
}

pub fn catalog_checks() -> Vec<CampaignCheck> {
    vec![
        CampaignCheck::new(
            "completion",
            "Campaign Completion",
            "every scenario is conquered exactly once",
            completion_expectation,
        ),
        CampaignCheck::new(
            "progress-rules",
            "Progress Rules",
            "availability and crossover partitions hold at every step",
            progress_rules_expectation,
        ),
        CampaignCheck::new(
            "save-roundtrip",
            "Save Round Trip",
            "saves taken mid-scenario restore identically",
            save_roundtrip_expectation,
        ),
        CampaignCheck::new(
            "determinism",
            "Deterministic Replay",
            "the same seed produces the same final save",
            determinism_expectation,
        ),
        CampaignCheck::new(
            "legacy-format",
            "Oldest Save Format",
            "the final state survives the oldest supported format",
            legacy_format_expectation,
        ),
        CampaignCheck::new(
            "restart",
            "Campaign Restart",
            "restarting a finished campaign returns to a fresh state",
            restart_expectation,
        ),
    ]
}

pub fn find_check(key: &str) -> Option<CampaignCheck> {
    catalog_checks().into_iter().find(|check| check.key == key)
}

fn completion_expectation(ctx: &CheckContext<'_>) -> Result<()> {
    let summary = ctx.summary;
    ensure!(summary.finished, "campaign did not finish");
    let order = summary.conquered_order();
    let unique: BTreeSet<ScenarioId> = order.iter().copied().collect();
    ensure!(
        unique.len() == order.len(),
        "a scenario was conquered twice: {order:?}"
    );
    ensure!(
        order.len() == ctx.simulator.scenario_count(),
        "conquered {} of {} scenarios",
        order.len(),
        ctx.simulator.scenario_count()
    );
    Ok(())
}

fn progress_rules_expectation(ctx: &CheckContext<'_>) -> Result<()> {
    let violations = &ctx.summary.violations;
    ensure!(violations.is_empty(), "{violations:?}");
    for step in &ctx.summary.steps {
        ensure!(
            step.placed + step.lost == step.eligible_heroes,
            "scenario {}: {} placed + {} lost != {} eligible",
            step.scenario,
            step.placed,
            step.lost,
            step.eligible_heroes
        );
    }
    Ok(())
}

fn save_roundtrip_expectation(ctx: &CheckContext<'_>) -> Result<()> {
    let failures = &ctx.summary.restore_failures;
    ensure!(failures.is_empty(), "{failures:?}");
    ensure!(
        ctx.summary.steps.iter().all(|step| step.save_bytes > 0),
        "an autosave was empty"
    );
    let bytes = campaign_engine::serialize(&ctx.summary.final_state)?;
    ensure!(
        deserialize(&bytes)? == ctx.summary.final_state,
        "final state did not restore identically"
    );
    Ok(())
}

fn determinism_expectation(ctx: &CheckContext<'_>) -> Result<()> {
    let summary = ctx.summary;
    let replay = ctx.simulator.run(summary.strategy, summary.seed)?;
    ensure!(
        replay.digest == summary.digest,
        "seed {} replayed to digest {} instead of {}",
        summary.seed,
        replay.digest,
        summary.digest
    );
    Ok(())
}

fn legacy_format_expectation(ctx: &CheckContext<'_>) -> Result<()> {
    let state = &ctx.summary.final_state;
    let bytes = serialize_with_version(state, MINIMUM_FORMAT)?;
    let restored = deserialize(&bytes)?;
    ensure!(
        restored.conquered_order() == state.conquered_order(),
        "conquest order changed in format {MINIMUM_FORMAT}"
    );
    for id in state.conquered_order() {
        ensure!(
            restored.bonus_id(*id) == state.bonus_id(*id),
            "bonus of scenario {id} changed in format {MINIMUM_FORMAT}"
        );
        ensure!(
            restored.crossover_heroes(*id).len() == state.crossover_heroes(*id).len(),
            "crossover heroes of scenario {id} changed in format {MINIMUM_FORMAT}"
        );
    }
    Ok(())
}

fn restart_expectation(ctx: &CheckContext<'_>) -> Result<()> {
    let mut state = ctx.summary.final_state.clone();
    state.restart();
    ensure!(
        &state == ctx.simulator.fresh_state(),
        "restarted campaign differs from a fresh one"
    );
    Ok(())
}
