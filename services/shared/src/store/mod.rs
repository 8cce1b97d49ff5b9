//! Storage and transport contracts of the jackpot services
//!
//! Adapters (Redis in production, `memory` in tests) implement these traits;
//! the place-bet and processing services only ever see the traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::bet::Bet;
use crate::contribution::JackpotContribution;
use crate::jackpot::Jackpot;
use crate::reward::JackpotReward;
use crate::types::{BetId, JackpotId};

pub mod memory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Jackpot {jackpot_id} was modified concurrently (expected version {expected_version})")]
    VersionConflict {
        jackpot_id: JackpotId,
        expected_version: u64,
    },

    #[error("Contribution for bet {0} already exists")]
    DuplicateContribution(BetId),

    #[error("Reward for bet {0} already exists")]
    DuplicateReward(BetId),

    #[error("Jackpot not found: {0}")]
    JackpotNotFound(JackpotId),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A jackpot together with the version it was loaded at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedJackpot {
    pub jackpot: Jackpot,
    pub version: u64,
}

#[async_trait]
pub trait JackpotStore: Send + Sync {
    async fn find_by_id(&self, jackpot_id: JackpotId) -> StoreResult<Option<VersionedJackpot>>;

    /// Persist `jackpot` if its stored version still equals `expected_version`
    ///
    /// Returns the new version.
    async fn save(&self, jackpot: &Jackpot, expected_version: u64) -> StoreResult<u64>;

    /// Store a new jackpot at version 0; returns `false` if one already exists
    async fn create_if_absent(&self, jackpot: &Jackpot) -> StoreResult<bool>;
}

#[async_trait]
pub trait ContributionStore: Send + Sync {
    async fn exists_by_bet_id(&self, bet_id: BetId) -> StoreResult<bool>;

    async fn find_by_bet_id(&self, bet_id: BetId) -> StoreResult<Option<JackpotContribution>>;

    /// Fails with `DuplicateContribution` if the bet already contributed
    async fn save(&self, contribution: &JackpotContribution) -> StoreResult<()>;
}

#[async_trait]
pub trait RewardStore: Send + Sync {
    async fn find_by_bet_id(&self, bet_id: BetId) -> StoreResult<Option<JackpotReward>>;

    /// Fails with `DuplicateReward` if the bet already has a reward
    async fn save(&self, reward: &JackpotReward) -> StoreResult<()>;
}

/// Read-only view of rewards for callers that never settle bets
#[async_trait]
pub trait RewardLookup: Send + Sync {
    async fn reward_for(&self, bet_id: BetId) -> StoreResult<Option<JackpotReward>>;
}

#[async_trait]
pub trait BetStore: Send + Sync {
    async fn exists_by_id(&self, bet_id: BetId) -> StoreResult<bool>;

    /// Insert the bet unless its id is taken; returns whether it was inserted
    async fn save(&self, bet: &Bet) -> StoreResult<bool>;
}

/// Outbound channel of placed bets
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, bet: &Bet) -> StoreResult<()>;
}

/// Everything one processed bet writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub jackpot: Jackpot,
    pub expected_version: u64,
    pub contribution: JackpotContribution,
    pub reward: Option<JackpotReward>,
}

/// Applies a `Settlement` as a single unit
///
/// The jackpot version check and the contribution uniqueness check happen
/// in the same atomic step as the writes, so either every record of the
/// settlement is stored or none is.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Returns the jackpot's new version, `VersionConflict` if the jackpot
    /// moved on, or `DuplicateContribution` if the bet was already settled.
    async fn commit(&self, settlement: &Settlement) -> StoreResult<u64>;
}
