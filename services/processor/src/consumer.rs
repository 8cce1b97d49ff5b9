//! Bet stream consumption
//!
//! Bets arrive on a Redis stream read through a consumer group. An entry stays
//! in the consumer's pending list until it is acknowledged, so a worker that
//! crashes or hits a transient failure sees the entry again when it re-reads
//! its pending list. Entries pending on a consumer that is gone (a worker
//! count lowered across a restart, a renamed host) are taken over with
//! XAUTOCLAIM once they have been idle long enough.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{
    StreamAutoClaimOptions, StreamAutoClaimReply, StreamId, StreamReadOptions, StreamReadReply,
};
use redis::AsyncCommands;

use shared::message::BetMessage;
use shared::store::{StoreError, StoreResult};
use shared::DomainError;
use tokio::sync::Mutex;

/// Start of a full scan of the group's pending entries
const CLAIM_FROM_START: &str = "0-0";

/// One stream entry handed to a worker
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub entry_id: String,
    pub message: Result<BetMessage, DomainError>,
}

/// Where bets come from
#[async_trait]
pub trait BetSource: Send + Sync {
    /// Take over entries any consumer of the group left unacknowledged for
    /// longer than the idle threshold; they become this consumer's pending
    async fn claim_stale(&self) -> StoreResult<Vec<Delivery>>;

    /// Entries delivered to this consumer earlier but never acknowledged
    async fn read_pending(&self) -> StoreResult<Vec<Delivery>>;

    /// Entries never delivered to anyone; may block for a while
    async fn read_new(&self) -> StoreResult<Vec<Delivery>>;

    async fn ack(&self, entry_id: &str) -> StoreResult<()>;
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub stream_key: String,
    pub group: String,
    pub consumer: String,
    pub batch_size: usize,
    pub block_ms: usize,
    /// Idle time after which another consumer's pending entry may be claimed
    pub claim_idle_ms: u64,
}

pub struct RedisBetStream {
    redis: ConnectionManager,
    settings: StreamSettings,
    claim_cursor: Mutex<String>,
}

impl RedisBetStream {
    pub fn new(redis: ConnectionManager, settings: StreamSettings) -> Self {
        Self {
            redis,
            settings,
            claim_cursor: Mutex::new(CLAIM_FROM_START.to_string()),
        }
    }

    /// Create the consumer group (and the stream) if missing
    pub async fn ensure_group(&self) -> StoreResult<()> {
        let mut redis_conn = self.redis.clone();
        let created: redis::RedisResult<()> = redis_conn
            .xgroup_create_mkstream(&self.settings.stream_key, &self.settings.group, "0")
            .await;
        match created {
            Ok(()) => {
                tracing::info!(
                    stream = %self.settings.stream_key,
                    group = %self.settings.group,
                    "Created consumer group"
                );
                Ok(())
            }
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    async fn read(&self, from_id: &str, options: StreamReadOptions) -> StoreResult<Vec<Delivery>> {
        let mut redis_conn = self.redis.clone();
        let reply: Option<StreamReadReply> = redis_conn
            .xread_options(&[&self.settings.stream_key], &[from_id], &options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(reply
            .map(|reply| {
                reply
                    .keys
                    .into_iter()
                    .flat_map(|key| key.ids)
                    .map(to_delivery)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn group_options(&self) -> StreamReadOptions {
        StreamReadOptions::default()
            .group(&self.settings.group, &self.settings.consumer)
            .count(self.settings.batch_size)
    }
}

#[async_trait]
impl BetSource for RedisBetStream {
    async fn claim_stale(&self) -> StoreResult<Vec<Delivery>> {
        // Held across the call so two claims never scan from the same cursor.
        let mut cursor = self.claim_cursor.lock().await;
        let mut redis_conn = self.redis.clone();
        let reply: StreamAutoClaimReply = redis_conn
            .xautoclaim_options(
                &self.settings.stream_key,
                &self.settings.group,
                &self.settings.consumer,
                self.settings.claim_idle_ms,
                cursor.as_str(),
                StreamAutoClaimOptions::default().count(self.settings.batch_size),
            )
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        *cursor = reply.next_stream_id;
        if !reply.deleted_ids.is_empty() {
            tracing::warn!(
                consumer = %self.settings.consumer,
                deleted = ?reply.deleted_ids,
                "Pending entries no longer in the stream were dropped"
            );
        }
        if !reply.claimed.is_empty() {
            tracing::info!(
                consumer = %self.settings.consumer,
                claimed = reply.claimed.len(),
                "Claimed stale pending entries"
            );
        }
        Ok(reply.claimed.into_iter().map(to_delivery).collect())
    }

    async fn read_pending(&self) -> StoreResult<Vec<Delivery>> {
        self.read("0", self.group_options()).await
    }

    async fn read_new(&self) -> StoreResult<Vec<Delivery>> {
        self.read(">", self.group_options().block(self.settings.block_ms))
            .await
    }

    async fn ack(&self, entry_id: &str) -> StoreResult<()> {
        let mut redis_conn = self.redis.clone();
        let _: i64 = redis_conn
            .xack(&self.settings.stream_key, &self.settings.group, &[entry_id])
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

fn to_delivery(entry: StreamId) -> Delivery {
    let fields = BetMessage::FIELDS
        .iter()
        .filter_map(|name| entry.get::<String>(name).map(|value| (*name, value)));
    Delivery {
        message: BetMessage::from_fields(fields),
        entry_id: entry.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::Value;
    use std::collections::HashMap;

    fn entry(fields: &[(&str, &str)]) -> StreamId {
        let map: HashMap<String, Value> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), Value::BulkString(v.as_bytes().to_vec())))
            .collect();
        StreamId {
            id: "1700000000000-0".to_string(),
            map,
        }
    }

    #[test]
    fn test_entry_fields_become_message() {
        let delivery = to_delivery(entry(&[
            ("betId", "b"),
            ("userId", "u"),
            ("jackpotId", "j"),
            ("amount", "10.00"),
            ("currency", "EUR"),
        ]));
        assert_eq!(delivery.entry_id, "1700000000000-0");
        let message = delivery.message.unwrap();
        assert_eq!(message.amount, "10.00");
        assert_eq!(message.jackpot_id, "j");
    }

    #[test]
    fn test_incomplete_entry_is_malformed() {
        // A trimmed stream can hand back pending ids with no fields.
        let delivery = to_delivery(entry(&[]));
        assert!(delivery.message.is_err());
    }
}
