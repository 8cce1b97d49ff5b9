use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use shared::keys::{bet_key, user_index_key};
use shared::message::BetMessage;
use shared::store::{BetStore, StoreResult};
use shared::{Bet, BetId};

use super::lua_scripts::SAVE_BET_SCRIPT;
use super::unavailable;

pub struct RedisBetRepository {
    redis: ConnectionManager,
    save_script: Script,
}

impl RedisBetRepository {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            save_script: Script::new(SAVE_BET_SCRIPT),
        }
    }
}

#[async_trait]
impl BetStore for RedisBetRepository {
    async fn exists_by_id(&self, bet_id: BetId) -> StoreResult<bool> {
        let mut redis_conn = self.redis.clone();
        redis_conn.exists(bet_key(bet_id)).await.map_err(unavailable)
    }

    async fn save(&self, bet: &Bet) -> StoreResult<bool> {
        let mut redis_conn = self.redis.clone();
        let message = BetMessage::from(bet);
        let created_at_ms = Utc::now().timestamp_millis();

        let mut invocation = self.save_script.prepare_invoke();
        invocation
            .key(bet_key(bet.bet_id()))
            .key(user_index_key(bet.user_id()))
            .arg(created_at_ms)
            .arg(&message.bet_id);
        for (field, value) in message.to_fields() {
            invocation.arg(field).arg(value);
        }
        invocation.arg("createdAtMs").arg(created_at_ms);

        let inserted: i64 = invocation
            .invoke_async(&mut redis_conn)
            .await
            .map_err(unavailable)?;
        Ok(inserted == 1)
    }
}
