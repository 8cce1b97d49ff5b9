//! Bet processing pipeline
//!
//! Turns one delivered bet into committed contribution and reward records,
//! exactly once per bet id:
//!
//! 1. A bet that already has a contribution is a duplicate delivery (no-op)
//! 2. Load the jackpot fresh, together with its version
//! 3. Contribute, evaluate the reward, and advance the cycle on a win
//! 4. Commit jackpot, contribution and reward as one unit against the loaded
//!    version
//!
//! A version conflict at step 4 discards the in-memory jackpot and restarts
//! from step 2 after a backoff. A duplicate-contribution rejection at step 4
//! means a concurrent worker settled the same bet first, which is reported as
//! `AlreadyProcessed`.

use backoff::backoff::Backoff;
use std::sync::Arc;

use shared::reward::RandomSource;
use shared::store::{ContributionStore, JackpotStore, Settlement, SettlementStore, StoreError};
use shared::{Bet, JackpotContribution, JackpotReward};

use crate::errors::{ProcessingError, Result};
use crate::retry_strategy::RetryStrategy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Processed {
        contribution: JackpotContribution,
        reward: Option<JackpotReward>,
    },
    AlreadyProcessed,
}

pub struct BetProcessingService {
    jackpots: Arc<dyn JackpotStore>,
    contributions: Arc<dyn ContributionStore>,
    settlements: Arc<dyn SettlementStore>,
    random: Arc<dyn RandomSource>,
    retry: RetryStrategy,
}

impl BetProcessingService {
    pub fn new(
        jackpots: Arc<dyn JackpotStore>,
        contributions: Arc<dyn ContributionStore>,
        settlements: Arc<dyn SettlementStore>,
        random: Arc<dyn RandomSource>,
        retry: RetryStrategy,
    ) -> Self {
        Self {
            jackpots,
            contributions,
            settlements,
            random,
            retry,
        }
    }

    pub async fn process(&self, bet: &Bet) -> Result<ProcessOutcome> {
        if self.contributions.exists_by_bet_id(bet.bet_id()).await? {
            tracing::warn!(bet_id = %bet.bet_id(), "Bet already processed, skipping");
            metrics::counter!("bets_already_processed_total").increment(1);
            return Ok(ProcessOutcome::AlreadyProcessed);
        }

        let mut backoff = self.retry.create_backoff();
        let mut retries = 0;

        loop {
            let loaded = self
                .jackpots
                .find_by_id(bet.jackpot_id())
                .await?
                .ok_or(ProcessingError::JackpotNotFound(bet.jackpot_id()))?;

            let mut jackpot = loaded.jackpot;
            let contribution = jackpot.contribute(bet)?;
            let reward = jackpot.evaluate_reward_for(bet, self.random.as_ref())?;
            if reward.is_some() {
                jackpot.start_next_cycle()?;
            }

            let settlement = Settlement {
                jackpot,
                expected_version: loaded.version,
                contribution,
                reward,
            };

            match self.settlements.commit(&settlement).await {
                Ok(version) => {
                    tracing::info!(
                        bet_id = %bet.bet_id(),
                        jackpot_id = %bet.jackpot_id(),
                        version,
                        retries,
                        contribution = %settlement.contribution.contribution_amount(),
                        won = settlement.reward.is_some(),
                        "Bet processed"
                    );
                    metrics::counter!("bets_processed_total").increment(1);
                    if settlement.reward.is_some() {
                        metrics::counter!("jackpot_rewards_total").increment(1);
                    }
                    return Ok(ProcessOutcome::Processed {
                        contribution: settlement.contribution,
                        reward: settlement.reward,
                    });
                }
                Err(StoreError::DuplicateContribution(_)) => {
                    tracing::warn!(bet_id = %bet.bet_id(), "Bet settled concurrently, skipping");
                    metrics::counter!("bets_already_processed_total").increment(1);
                    return Ok(ProcessOutcome::AlreadyProcessed);
                }
                Err(StoreError::VersionConflict { .. }) => {
                    metrics::counter!("jackpot_version_conflicts_total").increment(1);
                    if !self.retry.should_retry(retries) {
                        tracing::warn!(
                            bet_id = %bet.bet_id(),
                            jackpot_id = %bet.jackpot_id(),
                            attempts = retries + 1,
                            "Giving up after repeated version conflicts"
                        );
                        return Err(ProcessingError::RetriesExhausted {
                            bet_id: bet.bet_id(),
                            attempts: retries + 1,
                        });
                    }
                    retries += 1;
                    let delay = backoff
                        .next_backoff()
                        .unwrap_or_else(|| self.retry.max_interval());
                    tracing::debug!(
                        bet_id = %bet.bet_id(),
                        expected_version = loaded.version,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "Version conflict, reloading jackpot"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(other) => return Err(other.into()),
            }
        }
    }
}
