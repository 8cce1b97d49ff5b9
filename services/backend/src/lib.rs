//! Bet placement API. The binary wires Redis adapters into [`build_router`];
//! tests wire in-memory stores instead.

pub mod config;
pub mod domain;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod repository;
pub mod services;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use handlers::{bets, health};
use state::AppState;

fn bet_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(bets::place_bet))
        .route("/:bet_id/reward", get(bets::get_reward))
}

/// Routes under `/api/bets` plus `/health`, with permissive CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/bets", bet_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
