use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use shared::message::BetMessage;
use shared::store::{EventSink, StoreResult};
use shared::Bet;

use super::unavailable;

/// Publishes placed bets to the Redis stream the processor consumes
pub struct RedisStreamSink {
    redis: ConnectionManager,
    stream_key: String,
}

impl RedisStreamSink {
    pub fn new(redis: ConnectionManager, stream_key: impl Into<String>) -> Self {
        Self {
            redis,
            stream_key: stream_key.into(),
        }
    }
}

#[async_trait]
impl EventSink for RedisStreamSink {
    async fn publish(&self, bet: &Bet) -> StoreResult<()> {
        let mut redis_conn = self.redis.clone();
        let message = BetMessage::from(bet);
        let entry_id: String = redis_conn
            .xadd(&self.stream_key, "*", &message.to_fields())
            .await
            .map_err(unavailable)?;

        tracing::debug!(
            bet_id = %bet.bet_id(),
            stream = %self.stream_key,
            entry_id = %entry_id,
            "Published bet to stream"
        );
        Ok(())
    }
}
