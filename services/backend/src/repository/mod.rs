//! Redis adapters of the backend
//!
//! Bets are hashes under `bet:{id}` plus a per-user sorted set ordered by
//! placement time. Placed bets are appended to the bet stream the processor
//! consumes. Rewards are the JSON records the processor writes under
//! `reward:{bet_id}`; the backend only reads them.

mod bet_repository;
mod event_stream;
mod lua_scripts;
mod reward_reader;

use redis::RedisError;
use shared::store::StoreError;

pub use bet_repository::RedisBetRepository;
pub use event_stream::RedisStreamSink;
pub use reward_reader::RedisRewardReader;

fn unavailable(error: RedisError) -> StoreError {
    StoreError::Unavailable(error.to_string())
}
