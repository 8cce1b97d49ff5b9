//! Jackpot aggregate
//!
//! A `Jackpot` is a value reloaded from storage for every processing attempt;
//! it is never shared between workers. Winning is a two-step affair: the
//! reward is issued by `evaluate_reward_for`, and the caller then advances the
//! cycle with `start_next_cycle`.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::bet::Bet;
use crate::contribution::{ContributionCalculator, ContributionContext, JackpotContribution};
use crate::errors::{DomainError, Result};
use crate::money::Money;
use crate::reward::{JackpotReward, RandomSource, RewardContext, RewardEvaluator};
use crate::types::{CycleNumber, JackpotCycle, JackpotId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jackpot {
    jackpot_id: JackpotId,
    current_cycle: CycleNumber,
    initial_pool: Money,
    current_pool: Money,
    contribution_calculator: ContributionCalculator,
    reward_evaluator: RewardEvaluator,
}

impl Jackpot {
    /// A jackpot whose pool starts at its initial value
    pub fn new(
        jackpot_id: JackpotId,
        current_cycle: CycleNumber,
        initial_pool: Money,
        contribution_calculator: ContributionCalculator,
        reward_evaluator: RewardEvaluator,
    ) -> Result<Self> {
        Self::restore(
            jackpot_id,
            current_cycle,
            initial_pool,
            initial_pool,
            contribution_calculator,
            reward_evaluator,
        )
    }

    /// Rebuild a jackpot from persisted state
    pub fn restore(
        jackpot_id: JackpotId,
        current_cycle: CycleNumber,
        initial_pool: Money,
        current_pool: Money,
        contribution_calculator: ContributionCalculator,
        reward_evaluator: RewardEvaluator,
    ) -> Result<Self> {
        if initial_pool.amount() < Decimal::ZERO {
            return Err(DomainError::validation("initialPool must be >= 0"));
        }
        if current_pool.is_less_than(&initial_pool)? {
            return Err(DomainError::validation("currentPool must be >= initialPool"));
        }
        Ok(Self {
            jackpot_id,
            current_cycle,
            initial_pool,
            current_pool,
            contribution_calculator,
            reward_evaluator,
        })
    }

    /// Price the bet's contribution and add it to the pool
    ///
    /// Not idempotent: calling this twice for one bet contributes twice.
    pub fn contribute(&mut self, bet: &Bet) -> Result<JackpotContribution> {
        self.require_target(bet)?;
        if !bet.bet_amount().has_same_currency_as(&self.current_pool) {
            return Err(DomainError::CurrencyMismatch {
                left: bet.bet_amount().currency().to_string(),
                right: self.current_pool.currency().to_string(),
            });
        }
        if !bet.bet_amount().is_positive() {
            return Err(DomainError::validation("betAmount must be positive"));
        }

        let ctx = ContributionContext::new(bet.bet_amount(), self.current_pool, self.initial_pool)?;
        let contribution = self.contribution_calculator.calculate(&ctx)?;
        let pool_after = self.current_pool.plus(&contribution)?;

        let record = JackpotContribution::new(
            bet.bet_id(),
            bet.user_id(),
            self.cycle(),
            bet.bet_amount(),
            contribution,
            pool_after,
            Utc::now(),
        )?;
        self.current_pool = pool_after;

        tracing::info!(
            jackpot_id = %self.jackpot_id,
            cycle = %self.current_cycle,
            bet_id = %bet.bet_id(),
            contribution = %contribution,
            "Added contribution"
        );

        Ok(record)
    }

    /// Decide whether the bet wins the current pool
    ///
    /// Leaves the jackpot untouched; after a win the caller is expected to
    /// call `start_next_cycle`.
    pub fn evaluate_reward_for(
        &self,
        bet: &Bet,
        random: &dyn RandomSource,
    ) -> Result<Option<JackpotReward>> {
        self.require_target(bet)?;

        let ctx = RewardContext::new(self.current_pool)?;
        let won = self.reward_evaluator.evaluate(&ctx, random)?;

        tracing::info!(
            jackpot_id = %self.jackpot_id,
            cycle = %self.current_cycle,
            bet_id = %bet.bet_id(),
            result = if won { "win" } else { "loss" },
            "Evaluated bet for reward"
        );

        if !won {
            return Ok(None);
        }

        JackpotReward::new(
            bet.bet_id(),
            bet.user_id(),
            self.cycle(),
            self.current_pool,
            Utc::now(),
        )
        .map(Some)
    }

    /// Advance to the next cycle and reset the pool to its initial value
    pub fn start_next_cycle(&mut self) -> Result<()> {
        self.current_cycle = self.current_cycle.next()?;
        self.current_pool = self.initial_pool;

        tracing::info!(
            jackpot_id = %self.jackpot_id,
            cycle = %self.current_cycle,
            current_pool = %self.current_pool,
            "Started next cycle"
        );
        Ok(())
    }

    pub fn jackpot_id(&self) -> JackpotId {
        self.jackpot_id
    }

    pub fn current_cycle(&self) -> CycleNumber {
        self.current_cycle
    }

    pub fn cycle(&self) -> JackpotCycle {
        JackpotCycle::new(self.jackpot_id, self.current_cycle)
    }

    pub fn initial_pool(&self) -> Money {
        self.initial_pool
    }

    pub fn current_pool(&self) -> Money {
        self.current_pool
    }

    pub fn contribution_calculator(&self) -> &ContributionCalculator {
        &self.contribution_calculator
    }

    pub fn reward_evaluator(&self) -> &RewardEvaluator {
        &self.reward_evaluator
    }

    fn require_target(&self, bet: &Bet) -> Result<()> {
        if bet.jackpot_id() != self.jackpot_id {
            return Err(DomainError::TargetMismatch {
                bet_jackpot: bet.jackpot_id().to_string(),
                jackpot: self.jackpot_id.to_string(),
            });
        }
        Ok(())
    }
}
