//! Wire form of a placed bet
//!
//! The same shape travels as a stream entry (one field per member) and as
//! JSON. All members are strings so that no precision is lost in transit.

use serde::{Deserialize, Serialize};

use crate::bet::Bet;
use crate::errors::{DomainError, Result};
use crate::money::Money;
use crate::types::{BetId, JackpotId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetMessage {
    pub bet_id: String,
    pub user_id: String,
    pub jackpot_id: String,
    pub amount: String,
    pub currency: String,
}

impl BetMessage {
    /// Stream field names, in publishing order
    pub const FIELDS: [&'static str; 5] = ["betId", "userId", "jackpotId", "amount", "currency"];

    /// Field/value pairs for a stream entry
    pub fn to_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("betId", self.bet_id.as_str()),
            ("userId", self.user_id.as_str()),
            ("jackpotId", self.jackpot_id.as_str()),
            ("amount", self.amount.as_str()),
            ("currency", self.currency.as_str()),
        ]
    }

    /// Rebuild a message from stream entry fields
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut bet_id = None;
        let mut user_id = None;
        let mut jackpot_id = None;
        let mut amount = None;
        let mut currency = None;

        for (name, value) in fields {
            let slot = match name {
                "betId" => &mut bet_id,
                "userId" => &mut user_id,
                "jackpotId" => &mut jackpot_id,
                "amount" => &mut amount,
                "currency" => &mut currency,
                _ => continue,
            };
            *slot = Some(value);
        }

        let missing = |field: &str| DomainError::validation(format!("bet message is missing {}", field));
        Ok(Self {
            bet_id: bet_id.ok_or_else(|| missing("betId"))?,
            user_id: user_id.ok_or_else(|| missing("userId"))?,
            jackpot_id: jackpot_id.ok_or_else(|| missing("jackpotId"))?,
            amount: amount.ok_or_else(|| missing("amount"))?,
            currency: currency.ok_or_else(|| missing("currency"))?,
        })
    }

    /// Validate and convert into a domain `Bet`
    pub fn to_bet(&self) -> Result<Bet> {
        Bet::new(
            BetId::parse(&self.bet_id)?,
            UserId::parse(&self.user_id)?,
            JackpotId::parse(&self.jackpot_id)?,
            Money::of(&self.amount, &self.currency)?,
        )
    }
}

impl From<&Bet> for BetMessage {
    fn from(bet: &Bet) -> Self {
        Self {
            bet_id: bet.bet_id().to_string(),
            user_id: bet.user_id().to_string(),
            jackpot_id: bet.jackpot_id().to_string(),
            amount: bet.bet_amount().amount().to_string(),
            currency: bet.bet_amount().currency().to_string(),
        }
    }
}
