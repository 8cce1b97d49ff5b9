//! Conversion between jackpot hashes and domain values

use std::collections::HashMap;

use shared::keys::jackpot_fields as field;
use shared::store::{StoreError, StoreResult, VersionedJackpot};
use shared::strategy_config::StrategyConfig;
use shared::{ContributionCalculator, CycleNumber, Jackpot, JackpotId, Money, RewardEvaluator};

/// Rebuild a jackpot from its hash; an empty hash means no such jackpot
pub fn decode_jackpot(
    jackpot_id: JackpotId,
    fields: &HashMap<String, String>,
) -> StoreResult<Option<VersionedJackpot>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let get = |name: &str| {
        fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| corrupt(jackpot_id, format!("missing field {}", name)))
    };

    let currency = get(field::CURRENCY)?;
    let initial_pool = Money::of(get(field::INITIAL_AMOUNT)?, currency)
        .map_err(|e| corrupt(jackpot_id, e))?;
    let current_pool = Money::of(get(field::CURRENT_AMOUNT)?, currency)
        .map_err(|e| corrupt(jackpot_id, e))?;
    let cycle = get(field::CYCLE)?
        .parse::<i64>()
        .map_err(|e| corrupt(jackpot_id, e))
        .and_then(|value| CycleNumber::new(value).map_err(|e| corrupt(jackpot_id, e)))?;
    let version = get(field::VERSION)?
        .parse::<u64>()
        .map_err(|e| corrupt(jackpot_id, e))?;

    let contribution_config = StrategyConfig::from_json(get(field::CONTRIBUTION_CONFIG)?)
        .map_err(|e| corrupt(jackpot_id, e))?;
    let reward_config = StrategyConfig::from_json(get(field::REWARD_CONFIG)?)
        .map_err(|e| corrupt(jackpot_id, e))?;

    let jackpot = Jackpot::restore(
        jackpot_id,
        cycle,
        initial_pool,
        current_pool,
        ContributionCalculator::try_from(&contribution_config).map_err(|e| corrupt(jackpot_id, e))?,
        RewardEvaluator::try_from(&reward_config).map_err(|e| corrupt(jackpot_id, e))?,
    )
    .map_err(|e| corrupt(jackpot_id, e))?;

    Ok(Some(VersionedJackpot { jackpot, version }))
}

/// Arguments of the create script, in script order
pub fn creation_args(jackpot: &Jackpot) -> [String; 6] {
    [
        jackpot.initial_pool().amount().to_string(),
        jackpot.current_pool().amount().to_string(),
        jackpot.current_pool().currency().to_string(),
        jackpot.current_cycle().to_string(),
        StrategyConfig::from(jackpot.contribution_calculator()).to_json(),
        StrategyConfig::from(jackpot.reward_evaluator()).to_json(),
    ]
}

pub fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> StoreResult<T> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn corrupt(jackpot_id: JackpotId, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("jackpot {}: {}", jackpot_id, reason))
}
