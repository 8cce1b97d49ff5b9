pub mod circuit_breaker;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod processing;
pub mod redis_store;
pub mod retry_strategy;
pub mod seed;
pub mod worker_pool;
