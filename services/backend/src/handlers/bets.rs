use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::Instrument;

use shared::BetId;

use crate::{
    domain::{PlaceBetRequest, PlaceBetResponse, RewardResponse},
    errors::{AppError, Result},
    extractors::ValidatedJson,
    services::PlacementOutcome,
    state::AppState,
};

pub async fn place_bet(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PlaceBetRequest>,
) -> Result<(StatusCode, Json<PlaceBetResponse>)> {
    let span = tracing::info_span!(
        "place_bet",
        bet_id = %req.bet_id,
        jackpot_id = %req.jackpot_id,
        amount = %req.bet_amount.amount,
        currency = %req.bet_amount.currency
    );

    async move {
        let bet = req.to_bet()?;
        let outcome = state.place_bets.place(&bet).await?;

        Ok::<_, AppError>((
            StatusCode::ACCEPTED,
            Json(PlaceBetResponse {
                bet_id: bet.bet_id(),
                accepted: outcome == PlacementOutcome::Placed,
            }),
        ))
    }
    .instrument(span)
    .await
}

pub async fn get_reward(
    State(state): State<AppState>,
    Path(bet_id): Path<String>,
) -> Result<Json<RewardResponse>> {
    let bet_id = BetId::parse(&bet_id)?;
    let span = tracing::info_span!("get_reward", %bet_id);

    async move {
        let reward = state.rewards.reward_for(bet_id).await?;
        tracing::debug!(won = reward.is_some(), "Reward looked up");
        Ok::<_, AppError>(Json(RewardResponse::from(reward)))
    }
    .instrument(span)
    .await
}
