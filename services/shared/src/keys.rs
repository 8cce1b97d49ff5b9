//! Redis key generation functions
//!
//! Centralizes the key patterns shared by the backend and the processor.

use crate::types::{BetId, JackpotId, UserId};

/// Hash holding a jackpot's pool, cycle, strategies and version
const JACKPOT_KEY_PREFIX: &str = "jackpot:";

/// JSON contribution record, one per bet
const CONTRIBUTION_KEY_PREFIX: &str = "contribution:";

/// JSON reward record, at most one per bet
const REWARD_KEY_PREFIX: &str = "reward:";

/// Hash holding a placed bet
const BET_KEY_PREFIX: &str = "bet:";

/// Set of bet ids placed by a user
const USER_INDEX_PREFIX: &str = "bets:user:";

pub fn jackpot_key(jackpot_id: JackpotId) -> String {
    format!("{}{}", JACKPOT_KEY_PREFIX, jackpot_id)
}

pub fn contribution_key(bet_id: BetId) -> String {
    format!("{}{}", CONTRIBUTION_KEY_PREFIX, bet_id)
}

pub fn reward_key(bet_id: BetId) -> String {
    format!("{}{}", REWARD_KEY_PREFIX, bet_id)
}

pub fn bet_key(bet_id: BetId) -> String {
    format!("{}{}", BET_KEY_PREFIX, bet_id)
}

pub fn user_index_key(user_id: UserId) -> String {
    format!("{}{}", USER_INDEX_PREFIX, user_id)
}

/// Field names of the jackpot hash
pub mod jackpot_fields {
    pub const INITIAL_AMOUNT: &str = "initial_amount";
    pub const CURRENT_AMOUNT: &str = "current_amount";
    pub const CURRENCY: &str = "currency";
    pub const CYCLE: &str = "cycle";
    pub const VERSION: &str = "version";
    pub const CONTRIBUTION_CONFIG: &str = "contribution_config";
    pub const REWARD_CONFIG: &str = "reward_config";
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_key_formats() {
        assert_eq!(jackpot_key(JackpotId::parse(ID).unwrap()), format!("jackpot:{}", ID));
        assert_eq!(contribution_key(BetId::parse(ID).unwrap()), format!("contribution:{}", ID));
        assert_eq!(reward_key(BetId::parse(ID).unwrap()), format!("reward:{}", ID));
        assert_eq!(bet_key(BetId::parse(ID).unwrap()), format!("bet:{}", ID));
        assert_eq!(user_index_key(UserId::parse(ID).unwrap()), format!("bets:user:{}", ID));
    }
}
