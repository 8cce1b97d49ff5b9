use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use shared::keys::reward_key;
use shared::store::{RewardLookup, StoreError, StoreResult};
use shared::{BetId, JackpotReward};

use super::unavailable;

/// Reads the reward records written by the processor; it has no write path
pub struct RedisRewardReader {
    redis: ConnectionManager,
}

impl RedisRewardReader {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl RewardLookup for RedisRewardReader {
    async fn reward_for(&self, bet_id: BetId) -> StoreResult<Option<JackpotReward>> {
        let mut redis_conn = self.redis.clone();
        let raw: Option<String> = redis_conn.get(reward_key(bet_id)).await.map_err(unavailable)?;
        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))
        })
        .transpose()
    }
}
