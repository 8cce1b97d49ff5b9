//! Request and response bodies of the bet API

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use shared::{Bet, BetId, JackpotId, JackpotReward, Money, UserId};

use crate::errors::Result;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetRequest {
    #[validate(length(equal = 36, message = "betId must be a 36-character UUID"))]
    pub bet_id: String,

    #[validate(length(equal = 36, message = "userId must be a 36-character UUID"))]
    pub user_id: String,

    #[validate(length(equal = 36, message = "jackpotId must be a 36-character UUID"))]
    pub jackpot_id: String,

    #[validate]
    pub bet_amount: MoneyBody,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct MoneyBody {
    #[validate(custom = "validate_amount")]
    pub amount: String,

    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
}

impl PlaceBetRequest {
    pub fn to_bet(&self) -> Result<Bet> {
        let bet = Bet::new(
            BetId::parse(&self.bet_id)?,
            UserId::parse(&self.user_id)?,
            JackpotId::parse(&self.jackpot_id)?,
            Money::of(&self.bet_amount.amount, &self.bet_amount.currency)?,
        )?;
        Ok(bet)
    }
}

/// Accepts `\d+(\.\d{1,2})?` with a value above zero
fn validate_amount(amount: &str) -> std::result::Result<(), ValidationError> {
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (amount, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let well_formed = digits(whole)
        && fraction.map_or(true, |f| digits(f) && f.len() <= 2);
    let positive = amount.bytes().any(|b| (b'1'..=b'9').contains(&b));

    if well_formed && positive {
        Ok(())
    } else {
        let mut error = ValidationError::new("amount");
        error.message = Some(Cow::from(
            "amount must be a positive number with at most 2 decimals",
        ));
        Err(error)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetResponse {
    pub bet_id: BetId,
    /// False when the bet id had been placed before
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct RewardResponse {
    pub won: bool,
    pub reward: Option<Money>,
}

impl From<Option<JackpotReward>> for RewardResponse {
    fn from(reward: Option<JackpotReward>) -> Self {
        Self {
            won: reward.is_some(),
            reward: reward.map(|r| r.reward_amount()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_pattern() {
        for valid in ["10", "10.5", "10.50", "0.01", "007"] {
            assert!(validate_amount(valid).is_ok(), "{} should be accepted", valid);
        }
        for invalid in ["", "0", "0.00", "10.", ".5", "10.505", "-1", "1e3", " 10", "1,00"] {
            assert!(validate_amount(invalid).is_err(), "{} should be rejected", invalid);
        }
    }

    #[test]
    fn test_request_to_bet() {
        let request = PlaceBetRequest {
            bet_id: "0b8f7a64-2b7e-4a57-9d0a-0cc1f5e6d001".to_string(),
            user_id: "0b8f7a64-2b7e-4a57-9d0a-0cc1f5e6d002".to_string(),
            jackpot_id: "0b8f7a64-2b7e-4a57-9d0a-0cc1f5e6d003".to_string(),
            bet_amount: MoneyBody {
                amount: "12.5".to_string(),
                currency: "EUR".to_string(),
            },
        };
        assert!(request.validate().is_ok());
        let bet = request.to_bet().unwrap();
        assert_eq!(bet.bet_amount(), Money::of("12.50", "EUR").unwrap());
    }

    #[test]
    fn test_reward_response_shape() {
        let body = serde_json::to_value(RewardResponse::from(None)).unwrap();
        assert_eq!(body, serde_json::json!({"won": false, "reward": null}));
    }
}
