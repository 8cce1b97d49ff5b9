use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use processor::circuit_breaker::CircuitBreaker;
use processor::config::Config;
use processor::consumer::{BetSource, RedisBetStream, StreamSettings};
use processor::processing::BetProcessingService;
use processor::redis_store::RedisJackpotRepository;
use processor::retry_strategy::RetryStrategy;
use processor::seed;
use processor::worker_pool::{Worker, WorkerPool};
use shared::reward::ThreadRandom;

const CIRCUIT_BREAKER_THRESHOLD: u64 = 5;
const CIRCUIT_BREAKER_RESET: Duration = Duration::from_secs(30);
const WORKER_PAUSE: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    let log_format = init_tracing();

    tracing::info!(
        service = "processor",
        version = env!("CARGO_PKG_VERSION"),
        log_format,
        "Starting processor service"
    );

    let config = Config::load()?;
    tracing::info!(
        worker_count = config.processor.worker_count,
        batch_size = config.processor.batch_size,
        max_retries = config.processor.max_retries,
        stream = %config.redis.bet_stream,
        "Configuration loaded"
    );

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    tracing::info!("Connected to Redis");

    let repository = Arc::new(RedisJackpotRepository::new(redis_conn.clone()));

    if let Some(path) = &config.jackpot_seed_file {
        let created = seed::seed_from_file(repository.as_ref(), path).await?;
        tracing::info!(created, path = %path, "Jackpot seeding finished");
    }

    let service = Arc::new(BetProcessingService::new(
        repository.clone(),
        repository.clone(),
        repository.clone(),
        Arc::new(ThreadRandom),
        RetryStrategy::with_intervals(
            config.processor.max_retries,
            config.processor.retry_initial_interval(),
            config.processor.retry_max_interval(),
        ),
    ));

    let mut workers = Vec::with_capacity(config.processor.worker_count);
    for worker_id in 1..=config.processor.worker_count {
        let stream = RedisBetStream::new(
            redis_conn.clone(),
            StreamSettings {
                stream_key: config.redis.bet_stream.clone(),
                group: config.processor.consumer_group.clone(),
                consumer: format!("{}-{}", config.processor.consumer_name, worker_id),
                batch_size: config.processor.batch_size,
                block_ms: config.processor.block_ms,
                claim_idle_ms: config.processor.claim_idle_ms,
            },
        );
        if worker_id == 1 {
            stream.ensure_group().await?;
        }
        let source: Arc<dyn BetSource> = Arc::new(stream);
        workers.push(Worker::new(
            worker_id,
            source,
            service.clone(),
            CircuitBreaker::new(CIRCUIT_BREAKER_THRESHOLD, CIRCUIT_BREAKER_RESET),
            WORKER_PAUSE,
        ));
    }

    let metrics_handle = tokio::spawn(start_metrics_server(config.metrics_port, prometheus));

    let worker_pool = Arc::new(WorkerPool::new(workers));
    let worker_handle = tokio::spawn({
        let worker_pool = worker_pool.clone();
        async move { worker_pool.start().await }
    });

    tracing::info!("Processor running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    worker_pool.stop();
    match worker_handle.await {
        Ok(Err(e)) => tracing::error!(error = %e, "Worker pool exited with error"),
        Err(e) => tracing::error!(error = %e, "Worker pool task failed"),
        Ok(Ok(())) => {}
    }

    metrics_handle.abort();

    tracing::info!("Processor stopped");

    Ok(())
}

async fn start_metrics_server(port: u16, handle: PrometheusHandle) -> Result<()> {
    use axum::{routing::get, Router};
    use std::net::SocketAddr;

    let app = Router::new().route("/metrics", get(|| async move { handle.render() }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Processor metrics listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `LOG_FORMAT=json|text` (default json), filter from `RUST_LOG`
fn init_tracing() -> &'static str {
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "processor=info,shared=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    if json {
        "json"
    } else {
        "text"
    }
}
