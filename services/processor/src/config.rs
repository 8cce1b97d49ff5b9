use anyhow::{ensure, Context};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use shared::constants::{DEFAULT_BET_STREAM, DEFAULT_CONSUMER_GROUP, MAX_PROCESSING_RETRIES};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub processor: ProcessorConfig,
    pub redis: RedisConfig,
    pub metrics_port: u16,
    /// JSON file of jackpot definitions created at startup when missing
    pub jackpot_seed_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    pub worker_count: usize,
    pub batch_size: usize,
    pub block_ms: usize,
    /// Pending entries idle this long are claimed from whichever consumer holds them
    pub claim_idle_ms: u64,
    pub max_retries: u32,
    pub retry_initial_ms: u64,
    pub retry_max_ms: u64,
    pub consumer_group: String,
    /// Prefix of the per-worker consumer names
    pub consumer_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub bet_stream: String,
}

impl ProcessorConfig {
    pub fn retry_initial_interval(&self) -> Duration {
        Duration::from_millis(self.retry_initial_ms)
    }

    pub fn retry_max_interval(&self) -> Duration {
        Duration::from_millis(self.retry_max_ms)
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            processor: ProcessorConfig {
                worker_count: parsed("PROCESSOR_WORKER_COUNT", 4)?,
                batch_size: parsed("PROCESSOR_BATCH_SIZE", 16)?,
                block_ms: parsed("PROCESSOR_BLOCK_MS", 5000)?,
                claim_idle_ms: parsed("PROCESSOR_CLAIM_IDLE_MS", 30_000)?,
                max_retries: parsed("PROCESSOR_MAX_RETRIES", MAX_PROCESSING_RETRIES)?,
                retry_initial_ms: parsed("PROCESSOR_RETRY_INITIAL_MS", 10)?,
                retry_max_ms: parsed("PROCESSOR_RETRY_MAX_MS", 1000)?,
                consumer_group: var_or("PROCESSOR_CONSUMER_GROUP", DEFAULT_CONSUMER_GROUP),
                consumer_name: var_or("PROCESSOR_CONSUMER_NAME", "processor"),
            },
            redis: RedisConfig {
                url: var_or("REDIS_URL", "redis://localhost:6379"),
                bet_stream: var_or("BET_STREAM_KEY", DEFAULT_BET_STREAM),
            },
            metrics_port: parsed("PROCESSOR_METRICS_PORT", 9091)?,
            jackpot_seed_file: env::var("JACKPOT_SEED_FILE").ok().filter(|p| !p.is_empty()),
        };

        ensure!(config.processor.worker_count > 0, "PROCESSOR_WORKER_COUNT must be at least 1");
        ensure!(config.processor.batch_size > 0, "PROCESSOR_BATCH_SIZE must be at least 1");

        Ok(config)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
