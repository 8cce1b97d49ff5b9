/// HTTP tests for bet placement and reward queries
mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{bet_body, parse_error, TestContext};
use shared::store::{BetStore, RewardStore};
use shared::{BetId, CycleNumber, JackpotCycle, JackpotId, JackpotReward, Money, UserId};

#[tokio::test]
async fn test_place_bet_is_accepted_and_published() {
    let ctx = TestContext::new();
    let bet_id = Uuid::new_v4().to_string();

    let response = ctx
        .server
        .post("/api/bets")
        .json(&bet_body(&bet_id, "10.5", "EUR"))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["betId"], bet_id);
    assert_eq!(body["accepted"], true);

    let published = ctx.sink.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].bet_amount(), Money::of("10.50", "EUR").unwrap());
    assert!(ctx
        .store
        .exists_by_id(BetId::parse(&bet_id).unwrap())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_resubmitted_bet_is_accepted_but_not_republished() {
    let ctx = TestContext::new();
    let bet_id = Uuid::new_v4().to_string();
    let body = bet_body(&bet_id, "10", "EUR");

    ctx.server.post("/api/bets").json(&body).await.assert_status(StatusCode::ACCEPTED);
    let again = ctx.server.post("/api/bets").json(&body).await;

    again.assert_status(StatusCode::ACCEPTED);
    assert_eq!(again.json::<Value>()["accepted"], false);
    assert_eq!(ctx.sink.published().await.len(), 1);
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let ctx = TestContext::new();
    let bet_id = Uuid::new_v4().to_string();

    let cases = [
        bet_body("not-a-uuid", "10", "EUR"),
        bet_body(&bet_id, "0", "EUR"),
        bet_body(&bet_id, "10.555", "EUR"),
        bet_body(&bet_id, "-5", "EUR"),
        bet_body(&bet_id, "10", "EURO"),
    ];

    for body in cases {
        let response = ctx.server.post("/api/bets").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let (code, _, category) = parse_error(&response.json()).expect("error body");
        assert_eq!(code, "VALIDATION_INVALID_INPUT");
        assert_eq!(category, "Validation");
    }

    assert!(ctx.sink.published().await.is_empty());
}

#[tokio::test]
async fn test_malformed_uuid_of_right_length_is_rejected() {
    let ctx = TestContext::new();
    let not_hex = "zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz";

    let response = ctx
        .server
        .post("/api/bets")
        .json(&bet_body(not_hex, "10", "EUR"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let (code, _, _) = parse_error(&response.json()).expect("error body");
    assert_eq!(code, "VALIDATION_INVALID_ID");
}

#[tokio::test]
async fn test_lowercase_currency_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/bets")
        .json(&bet_body(&Uuid::new_v4().to_string(), "10", "eur"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let (code, _, _) = parse_error(&response.json()).expect("error body");
    assert_eq!(code, "VALIDATION_INVALID_CURRENCY");
}

#[tokio::test]
async fn test_missing_field_is_named() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/bets")
        .json(&json!({
            "userId": "5d1c9e4a-7c1b-4a8e-9a51-6f0f2a7d3b21",
            "jackpotId": "a3e0b3f2-1f7d-4f44-8b8e-2d9d0c6c7e15",
            "betAmount": {"amount": "10", "currency": "EUR"}
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let (code, message, _) = parse_error(&response.json()).expect("error body");
    assert_eq!(code, "VALIDATION_MISSING_FIELD");
    assert!(message.contains("betId"));
}

#[tokio::test]
async fn test_reward_query() {
    let ctx = TestContext::new();
    let bet_id = BetId::new();
    let reward = JackpotReward::new(
        bet_id,
        UserId::new(),
        JackpotCycle::new(JackpotId::new(), CycleNumber::FIRST),
        Money::of("121.00", "EUR").unwrap(),
        Utc::now(),
    )
    .unwrap();
    RewardStore::save(ctx.store.as_ref(), &reward).await.unwrap();

    let won = ctx.server.get(&format!("/api/bets/{}/reward", bet_id)).await;
    won.assert_status_ok();
    assert_eq!(
        won.json::<Value>(),
        json!({"won": true, "reward": {"amount": "121.00", "currency": "EUR"}})
    );

    let lost = ctx
        .server
        .get(&format!("/api/bets/{}/reward", BetId::new()))
        .await;
    lost.assert_status_ok();
    assert_eq!(lost.json::<Value>(), json!({"won": false, "reward": null}));
}

#[tokio::test]
async fn test_reward_query_with_invalid_id() {
    let ctx = TestContext::new();

    let response = ctx.server.get("/api/bets/not-a-bet/reward").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let (code, _, category) = parse_error(&response.json()).expect("error body");
    assert_eq!(code, "VALIDATION_INVALID_ID");
    assert_eq!(category, "Validation");
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();

    let response = ctx.server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}
