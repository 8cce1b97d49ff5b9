//! Jackpot seeding
//!
//! Jackpots are configured out of band. At startup the processor can read a
//! JSON array of definitions and create every jackpot that does not exist yet;
//! existing jackpots keep their pool, cycle and version.
//!
//! ```json
//! [{
//!   "jackpotId": "9b2f8c1e-0d0c-4a53-9a43-0f5f1c2f6a10",
//!   "initialPool": {"amount": "1000.00", "currency": "EUR"},
//!   "contribution": {"type": "FIXED", "config": {"rate": "5"}},
//!   "reward": {"type": "FIXED_CHANCE", "config": {"chancePercent": "0.1"}}
//! }]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;

use shared::store::JackpotStore;
use shared::strategy_config::StrategyConfig;
use shared::{ContributionCalculator, CycleNumber, Jackpot, JackpotId, Money, RewardEvaluator};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JackpotDefinition {
    pub jackpot_id: JackpotId,
    pub initial_pool: Money,
    pub contribution: StrategyConfig,
    pub reward: StrategyConfig,
}

impl JackpotDefinition {
    pub fn to_jackpot(&self) -> Result<Jackpot> {
        let jackpot = Jackpot::new(
            self.jackpot_id,
            CycleNumber::FIRST,
            self.initial_pool,
            ContributionCalculator::try_from(&self.contribution)?,
            RewardEvaluator::try_from(&self.reward)?,
        )?;
        Ok(jackpot)
    }
}

pub fn parse_definitions(raw: &str) -> Result<Vec<Jackpot>> {
    let definitions: Vec<JackpotDefinition> =
        serde_json::from_str(raw).context("Invalid jackpot definitions")?;
    definitions
        .iter()
        .map(|definition| {
            definition
                .to_jackpot()
                .with_context(|| format!("Invalid definition of jackpot {}", definition.jackpot_id))
        })
        .collect()
}

/// Create the jackpots that are missing; returns how many were created
pub async fn seed_jackpots(store: &dyn JackpotStore, jackpots: &[Jackpot]) -> Result<usize> {
    let mut created = 0;
    for jackpot in jackpots {
        if store.create_if_absent(jackpot).await? {
            tracing::info!(
                jackpot_id = %jackpot.jackpot_id(),
                initial_pool = %jackpot.initial_pool(),
                contribution = jackpot.contribution_calculator().type_name(),
                reward = jackpot.reward_evaluator().type_name(),
                "Seeded jackpot"
            );
            created += 1;
        } else {
            tracing::debug!(jackpot_id = %jackpot.jackpot_id(), "Jackpot already exists");
        }
    }
    Ok(created)
}

pub async fn seed_from_file(store: &dyn JackpotStore, path: &str) -> Result<usize> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read jackpot seed file {}", path))?;
    let jackpots = parse_definitions(&raw)?;
    seed_jackpots(store, &jackpots).await
}
