use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backend::config::Config;
use backend::repository::{RedisBetRepository, RedisRewardReader, RedisStreamSink};
use backend::services::PlaceBetService;
use backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_format = init_tracing();

    tracing::info!(
        service = "backend",
        version = env!("CARGO_PKG_VERSION"),
        log_format,
        "Starting backend service"
    );

    let config = Config::load()?;
    tracing::info!(stream = %config.redis.bet_stream, "Configuration loaded");

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let redis_client = redis::Client::open(config.redis.url.clone())?;
    let redis_conn = redis_client.get_connection_manager().await?;
    tracing::info!("Redis connected");

    let place_bets = PlaceBetService::new(
        Arc::new(RedisBetRepository::new(redis_conn.clone())),
        Arc::new(RedisStreamSink::new(
            redis_conn.clone(),
            config.redis.bet_stream.clone(),
        )),
    );
    let rewards = Arc::new(RedisRewardReader::new(redis_conn));

    let api_port = config.api_port;
    let metrics_port = config.metrics_port;
    let app = backend::build_router(AppState::new(config, place_bets, rewards));

    let metrics_app = Router::new().route("/metrics", get(|| async move { prometheus.render() }));
    let metrics_handle = tokio::spawn(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
        tracing::info!("Metrics server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, metrics_app).await?;
        Ok::<_, anyhow::Error>(())
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], api_port));
    tracing::info!("Backend API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    metrics_handle.abort();
    tracing::info!("Backend stopped");

    Ok(())
}

/// `LOG_FORMAT=json|text` (default text), filter from `RUST_LOG`
fn init_tracing() -> &'static str {
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "backend=info,shared=info,tower_http=info".into());

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
