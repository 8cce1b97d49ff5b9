//! Redis-backed jackpot, contribution and reward stores
//!
//! Jackpots are hashes (`jackpot:{id}`) carrying a version field. Contributions
//! and rewards are JSON strings keyed by bet id. All writes that touch a
//! jackpot go through the Lua scripts in `lua_scripts` so that the version
//! check and the write happen atomically on the server.

mod codec;
mod lua_scripts;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, Script};
use std::collections::HashMap;

use shared::keys::{contribution_key, jackpot_key, reward_key};
use shared::store::{
    ContributionStore, JackpotStore, RewardStore, Settlement, SettlementStore, StoreError,
    StoreResult, VersionedJackpot,
};
use shared::{BetId, Jackpot, JackpotContribution, JackpotId, JackpotReward};

pub use codec::decode_jackpot;
use lua_scripts::*;

pub struct RedisJackpotRepository {
    redis: ConnectionManager,
    save_script: Script,
    commit_script: Script,
    create_script: Script,
}

impl RedisJackpotRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            save_script: Script::new(SAVE_JACKPOT_SCRIPT),
            commit_script: Script::new(COMMIT_SETTLEMENT_SCRIPT),
            create_script: Script::new(CREATE_JACKPOT_SCRIPT),
        }
    }

    /// Store a JSON record unless the key exists; returns whether it was written
    async fn set_if_absent(&self, key: String, json: String) -> StoreResult<bool> {
        let mut redis_conn = self.redis.clone();
        let written: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .arg("NX")
            .query_async(&mut redis_conn)
            .await
            .map_err(unavailable)?;
        Ok(written.is_some())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: String) -> StoreResult<Option<T>> {
        let mut redis_conn = self.redis.clone();
        let raw: Option<String> = redis_conn.get(&key).await.map_err(unavailable)?;
        raw.map(|raw| codec::from_json(&raw)).transpose()
    }
}

/// Translate a script status into the new version or a store error
fn script_status(
    status: i64,
    jackpot_id: JackpotId,
    bet_id: Option<BetId>,
    expected_version: u64,
) -> StoreResult<u64> {
    match (status, bet_id) {
        (MISSING, _) => Err(StoreError::JackpotNotFound(jackpot_id)),
        (VERSION_CONFLICT, _) => Err(StoreError::VersionConflict {
            jackpot_id,
            expected_version,
        }),
        (DUPLICATE_CONTRIBUTION, Some(bet_id)) => Err(StoreError::DuplicateContribution(bet_id)),
        (DUPLICATE_REWARD, Some(bet_id)) => Err(StoreError::DuplicateReward(bet_id)),
        (version, _) if version > 0 => Ok(version as u64),
        (other, _) => Err(StoreError::Corrupt(format!(
            "unexpected script status {} for jackpot {}",
            other, jackpot_id
        ))),
    }
}

fn unavailable(error: RedisError) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

#[async_trait]
impl JackpotStore for RedisJackpotRepository {
    async fn find_by_id(&self, jackpot_id: JackpotId) -> StoreResult<Option<VersionedJackpot>> {
        let mut redis_conn = self.redis.clone();
        let fields: HashMap<String, String> = redis_conn
            .hgetall(jackpot_key(jackpot_id))
            .await
            .map_err(unavailable)?;
        decode_jackpot(jackpot_id, &fields)
    }

    async fn save(&self, jackpot: &Jackpot, expected_version: u64) -> StoreResult<u64> {
        let mut redis_conn = self.redis.clone();
        let status: i64 = self
            .save_script
            .key(jackpot_key(jackpot.jackpot_id()))
            .arg(expected_version)
            .arg(jackpot.current_pool().amount().to_string())
            .arg(jackpot.current_cycle().value())
            .invoke_async(&mut redis_conn)
            .await
            .map_err(unavailable)?;
        script_status(status, jackpot.jackpot_id(), None, expected_version)
    }

    async fn create_if_absent(&self, jackpot: &Jackpot) -> StoreResult<bool> {
        let mut redis_conn = self.redis.clone();
        let mut invocation = self.create_script.key(jackpot_key(jackpot.jackpot_id()));
        for arg in codec::creation_args(jackpot) {
            invocation.arg(arg);
        }
        let created: i64 = invocation
            .invoke_async(&mut redis_conn)
            .await
            .map_err(unavailable)?;
        Ok(created == 1)
    }
}

#[async_trait]
impl ContributionStore for RedisJackpotRepository {
    async fn exists_by_bet_id(&self, bet_id: BetId) -> StoreResult<bool> {
        let mut redis_conn = self.redis.clone();
        redis_conn
            .exists(contribution_key(bet_id))
            .await
            .map_err(unavailable)
    }

    async fn find_by_bet_id(&self, bet_id: BetId) -> StoreResult<Option<JackpotContribution>> {
        self.get_json(contribution_key(bet_id)).await
    }

    async fn save(&self, contribution: &JackpotContribution) -> StoreResult<()> {
        let bet_id = contribution.bet_id();
        if !self
            .set_if_absent(contribution_key(bet_id), codec::to_json(contribution)?)
            .await?
        {
            return Err(StoreError::DuplicateContribution(bet_id));
        }
        Ok(())
    }
}

#[async_trait]
impl RewardStore for RedisJackpotRepository {
    async fn find_by_bet_id(&self, bet_id: BetId) -> StoreResult<Option<JackpotReward>> {
        self.get_json(reward_key(bet_id)).await
    }

    async fn save(&self, reward: &JackpotReward) -> StoreResult<()> {
        let bet_id = reward.bet_id();
        if !self
            .set_if_absent(reward_key(bet_id), codec::to_json(reward)?)
            .await?
        {
            return Err(StoreError::DuplicateReward(bet_id));
        }
        Ok(())
    }
}

#[async_trait]
impl SettlementStore for RedisJackpotRepository {
    async fn commit(&self, settlement: &Settlement) -> StoreResult<u64> {
        let jackpot = &settlement.jackpot;
        let bet_id = settlement.contribution.bet_id();
        let reward_json = match &settlement.reward {
            Some(reward) => codec::to_json(reward)?,
            None => String::new(),
        };

        let mut redis_conn = self.redis.clone();
        let status: i64 = self
            .commit_script
            .key(jackpot_key(jackpot.jackpot_id()))
            .key(contribution_key(bet_id))
            .key(reward_key(bet_id))
            .arg(settlement.expected_version)
            .arg(jackpot.current_pool().amount().to_string())
            .arg(jackpot.current_cycle().value())
            .arg(codec::to_json(&settlement.contribution)?)
            .arg(reward_json)
            .invoke_async(&mut redis_conn)
            .await
            .map_err(unavailable)?;

        script_status(status, jackpot.jackpot_id(), Some(bet_id), settlement.expected_version)
    }
}
