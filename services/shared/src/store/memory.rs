//! In-process implementations of the store traits
//!
//! All maps live behind one lock so that `commit` is atomic in the same way
//! the Redis script is.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{
    BetStore, ContributionStore, EventSink, JackpotStore, RewardLookup, RewardStore, Settlement,
    SettlementStore, StoreError, StoreResult, VersionedJackpot,
};
use crate::bet::Bet;
use crate::contribution::JackpotContribution;
use crate::jackpot::Jackpot;
use crate::reward::JackpotReward;
use crate::types::{BetId, JackpotId};

#[derive(Default)]
struct State {
    jackpots: HashMap<JackpotId, VersionedJackpot>,
    contributions: HashMap<BetId, JackpotContribution>,
    rewards: HashMap<BetId, JackpotReward>,
    bets: HashMap<BetId, Bet>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contribution_count(&self) -> usize {
        self.state.lock().await.contributions.len()
    }

    pub async fn reward_count(&self) -> usize {
        self.state.lock().await.rewards.len()
    }
}

#[async_trait]
impl JackpotStore for InMemoryStore {
    async fn find_by_id(&self, jackpot_id: JackpotId) -> StoreResult<Option<VersionedJackpot>> {
        Ok(self.state.lock().await.jackpots.get(&jackpot_id).cloned())
    }

    async fn save(&self, jackpot: &Jackpot, expected_version: u64) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        save_jackpot(&mut state, jackpot, expected_version)
    }

    async fn create_if_absent(&self, jackpot: &Jackpot) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if state.jackpots.contains_key(&jackpot.jackpot_id()) {
            return Ok(false);
        }
        state.jackpots.insert(
            jackpot.jackpot_id(),
            VersionedJackpot {
                jackpot: jackpot.clone(),
                version: 0,
            },
        );
        Ok(true)
    }
}

fn save_jackpot(state: &mut State, jackpot: &Jackpot, expected_version: u64) -> StoreResult<u64> {
    let stored = state
        .jackpots
        .get_mut(&jackpot.jackpot_id())
        .ok_or(StoreError::JackpotNotFound(jackpot.jackpot_id()))?;
    if stored.version != expected_version {
        return Err(StoreError::VersionConflict {
            jackpot_id: jackpot.jackpot_id(),
            expected_version,
        });
    }
    stored.jackpot = jackpot.clone();
    stored.version += 1;
    Ok(stored.version)
}

#[async_trait]
impl ContributionStore for InMemoryStore {
    async fn exists_by_bet_id(&self, bet_id: BetId) -> StoreResult<bool> {
        Ok(self.state.lock().await.contributions.contains_key(&bet_id))
    }

    async fn find_by_bet_id(&self, bet_id: BetId) -> StoreResult<Option<JackpotContribution>> {
        Ok(self.state.lock().await.contributions.get(&bet_id).cloned())
    }

    async fn save(&self, contribution: &JackpotContribution) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.contributions.contains_key(&contribution.bet_id()) {
            return Err(StoreError::DuplicateContribution(contribution.bet_id()));
        }
        state
            .contributions
            .insert(contribution.bet_id(), contribution.clone());
        Ok(())
    }
}

#[async_trait]
impl RewardStore for InMemoryStore {
    async fn find_by_bet_id(&self, bet_id: BetId) -> StoreResult<Option<JackpotReward>> {
        Ok(self.state.lock().await.rewards.get(&bet_id).cloned())
    }

    async fn save(&self, reward: &JackpotReward) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.rewards.contains_key(&reward.bet_id()) {
            return Err(StoreError::DuplicateReward(reward.bet_id()));
        }
        state.rewards.insert(reward.bet_id(), reward.clone());
        Ok(())
    }
}

#[async_trait]
impl RewardLookup for InMemoryStore {
    async fn reward_for(&self, bet_id: BetId) -> StoreResult<Option<JackpotReward>> {
        RewardStore::find_by_bet_id(self, bet_id).await
    }
}

#[async_trait]
impl BetStore for InMemoryStore {
    async fn exists_by_id(&self, bet_id: BetId) -> StoreResult<bool> {
        Ok(self.state.lock().await.bets.contains_key(&bet_id))
    }

    async fn save(&self, bet: &Bet) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if state.bets.contains_key(&bet.bet_id()) {
            return Ok(false);
        }
        state.bets.insert(bet.bet_id(), bet.clone());
        Ok(true)
    }
}

#[async_trait]
impl SettlementStore for InMemoryStore {
    async fn commit(&self, settlement: &Settlement) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let bet_id = settlement.contribution.bet_id();

        if state.contributions.contains_key(&bet_id) {
            return Err(StoreError::DuplicateContribution(bet_id));
        }
        if let Some(reward) = &settlement.reward {
            if state.rewards.contains_key(&reward.bet_id()) {
                return Err(StoreError::DuplicateReward(reward.bet_id()));
            }
        }

        let version = save_jackpot(&mut state, &settlement.jackpot, settlement.expected_version)?;
        state
            .contributions
            .insert(bet_id, settlement.contribution.clone());
        if let Some(reward) = &settlement.reward {
            state.rewards.insert(reward.bet_id(), reward.clone());
        }
        Ok(version)
    }
}

/// Event sink that keeps every published bet
#[derive(Default)]
pub struct RecordingEventSink {
    published: Mutex<Vec<Bet>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<Bet> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, bet: &Bet) -> StoreResult<()> {
        self.published.lock().await.push(bet.clone());
        Ok(())
    }
}
