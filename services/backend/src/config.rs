use anyhow::Context;
use serde::Deserialize;
use std::env;

use shared::constants::DEFAULT_BET_STREAM;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_port: u16,
    pub metrics_port: u16,
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    /// Stream placed bets are published to
    pub bet_stream: String,
}

impl Config {
    /// Reads `.env` if present, then the process environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            api_port: port("API_PORT", 3001)?,
            metrics_port: port("METRICS_PORT", 9090)?,
            redis: RedisConfig {
                url: var_or("REDIS_URL", "redis://localhost:6379"),
                bet_stream: var_or("BET_STREAM_KEY", DEFAULT_BET_STREAM),
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn port(key: &str, default: u16) -> anyhow::Result<u16> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} must be a port number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
