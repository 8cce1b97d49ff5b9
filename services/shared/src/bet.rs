use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::money::Money;
use crate::types::{BetId, JackpotId, UserId};

/// A placed wager, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    bet_id: BetId,
    user_id: UserId,
    jackpot_id: JackpotId,
    bet_amount: Money,
}

impl Bet {
    pub fn new(bet_id: BetId, user_id: UserId, jackpot_id: JackpotId, bet_amount: Money) -> Result<Self> {
        if !bet_amount.is_positive() {
            return Err(DomainError::validation("betAmount must be positive"));
        }
        Ok(Self {
            bet_id,
            user_id,
            jackpot_id,
            bet_amount,
        })
    }

    pub fn bet_id(&self) -> BetId {
        self.bet_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn jackpot_id(&self) -> JackpotId {
        self.jackpot_id
    }

    pub fn bet_amount(&self) -> Money {
        self.bet_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bet_amount_must_be_positive() {
        let zero = Bet::new(BetId::new(), UserId::new(), JackpotId::new(), Money::of("0", "EUR").unwrap());
        assert!(matches!(zero, Err(DomainError::Validation(_))));

        let bet = Bet::new(BetId::new(), UserId::new(), JackpotId::new(), Money::of("0.01", "EUR").unwrap());
        assert!(bet.is_ok());
    }
}
