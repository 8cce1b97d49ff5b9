//! Shared fixtures for the HTTP tests: the real router over in-memory stores
#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use backend::config::{Config, RedisConfig};
use backend::services::PlaceBetService;
use backend::state::AppState;
use shared::store::memory::{InMemoryStore, RecordingEventSink};

pub struct TestContext {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    pub sink: Arc<RecordingEventSink>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let sink = Arc::new(RecordingEventSink::new());
        let state = AppState::new(
            test_config(),
            PlaceBetService::new(store.clone(), sink.clone()),
            store.clone(),
        );
        let server = TestServer::new(backend::build_router(state))
            .expect("Failed to start test server");

        Self {
            server,
            store,
            sink,
        }
    }
}

pub fn test_config() -> Config {
    Config {
        api_port: 0,
        metrics_port: 0,
        redis: RedisConfig {
            url: "redis://127.0.0.1:6379/1".to_string(),
            bet_stream: "jackpot:bets:test".to_string(),
        },
    }
}

pub fn bet_body(bet_id: &str, amount: &str, currency: &str) -> Value {
    json!({
        "betId": bet_id,
        "userId": "5d1c9e4a-7c1b-4a8e-9a51-6f0f2a7d3b21",
        "jackpotId": "a3e0b3f2-1f7d-4f44-8b8e-2d9d0c6c7e15",
        "betAmount": {"amount": amount, "currency": currency}
    })
}

/// Helper function to parse error response
pub fn parse_error(body: &Value) -> Option<(String, String, String)> {
    let error = body.get("error")?;

    Some((
        error.get("code")?.as_str()?.to_string(),
        error.get("message")?.as_str()?.to_string(),
        error.get("category")?.as_str()?.to_string(),
    ))
}
