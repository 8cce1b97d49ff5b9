//! Contribution strategies and the contribution record
//!
//! A contribution is the share of a stake that flows into the jackpot pool.
//! The strategy is a closed set of variants selected by configuration.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::money::Money;
use crate::percentage::{DecayFactor, Percentage};
use crate::types::{BetId, CycleNumber, JackpotCycle, JackpotId, UserId};

/// Inputs of a contribution calculation, validated once per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionContext {
    bet_amount: Money,
    current_pool: Money,
    initial_pool: Money,
}

impl ContributionContext {
    pub fn new(bet_amount: Money, current_pool: Money, initial_pool: Money) -> Result<Self> {
        if !bet_amount.is_positive() {
            return Err(DomainError::validation("betAmount must be > 0"));
        }
        if !bet_amount.has_same_currency_as(&current_pool) {
            return Err(DomainError::CurrencyMismatch {
                left: bet_amount.currency().to_string(),
                right: current_pool.currency().to_string(),
            });
        }
        if !bet_amount.has_same_currency_as(&initial_pool) {
            return Err(DomainError::CurrencyMismatch {
                left: bet_amount.currency().to_string(),
                right: initial_pool.currency().to_string(),
            });
        }
        if !current_pool.is_greater_than_or_equal(&initial_pool)? {
            return Err(DomainError::validation("currentPool must be >= initialPool"));
        }
        Ok(Self {
            bet_amount,
            current_pool,
            initial_pool,
        })
    }

    pub fn bet_amount(&self) -> Money {
        self.bet_amount
    }

    pub fn current_pool(&self) -> Money {
        self.current_pool
    }

    pub fn initial_pool(&self) -> Money {
        self.initial_pool
    }
}

/// How much of a stake is added to the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionCalculator {
    /// A constant share of every stake
    Fixed { rate: Percentage },

    /// A share that starts at `starting_rate` and shrinks by
    /// `decay_factor` per unit of pool growth, floored at `minimum_rate`
    Variable {
        starting_rate: Percentage,
        minimum_rate: Percentage,
        decay_factor: DecayFactor,
    },
}

impl ContributionCalculator {
    pub fn fixed(rate: Percentage) -> Result<Self> {
        if rate.is_zero() || rate.is_hundred() {
            return Err(DomainError::validation(
                "rate must be greater than 0.00 and less than 100.00",
            ));
        }
        Ok(Self::Fixed { rate })
    }

    pub fn variable(
        starting_rate: Percentage,
        minimum_rate: Percentage,
        decay_factor: DecayFactor,
    ) -> Result<Self> {
        if starting_rate.is_zero() || starting_rate.is_hundred() {
            return Err(DomainError::validation(
                "startingRate must be greater than 0.00 and less than 100.00",
            ));
        }
        if minimum_rate.is_zero() || minimum_rate.is_hundred() {
            return Err(DomainError::validation(
                "minimumRate must be greater than 0.00 and less than 100.00",
            ));
        }
        if starting_rate <= minimum_rate {
            return Err(DomainError::validation(
                "startingRate must be greater than minimumRate",
            ));
        }
        Ok(Self::Variable {
            starting_rate,
            minimum_rate,
            decay_factor,
        })
    }

    /// Contribution of the context's stake, in the stake's currency
    pub fn calculate(&self, ctx: &ContributionContext) -> Result<Money> {
        match self {
            Self::Fixed { rate } => ctx.bet_amount().times(rate.fractional_value()),
            Self::Variable {
                starting_rate,
                minimum_rate,
                decay_factor,
            } => {
                let growth = ctx.current_pool().minus(&ctx.initial_pool())?.amount();
                let decayed = decay_factor
                    .value()
                    .checked_mul(growth)
                    .and_then(|decay| starting_rate.value().checked_sub(decay))
                    .unwrap_or(minimum_rate.value());
                let rate = Percentage::new(decayed.max(minimum_rate.value()))?;
                ctx.bet_amount().times(rate.fractional_value())
            }
        }
    }

    /// Configuration tag of this variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "FIXED",
            Self::Variable { .. } => "VARIABLE",
        }
    }
}

/// A bet's contribution applied to one jackpot cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JackpotContribution {
    bet_id: BetId,
    user_id: UserId,
    jackpot_id: JackpotId,
    cycle: CycleNumber,
    stake_amount: Money,
    contribution_amount: Money,
    current_jackpot_amount: Money,
    created_at: DateTime<Utc>,
}

impl JackpotContribution {
    pub fn new(
        bet_id: BetId,
        user_id: UserId,
        jackpot_cycle: JackpotCycle,
        stake_amount: Money,
        contribution_amount: Money,
        current_jackpot_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if !stake_amount.is_positive() {
            return Err(DomainError::validation("stakeAmount must be positive"));
        }
        if contribution_amount.amount() < Decimal::ZERO {
            return Err(DomainError::validation("contributionAmount must be >= 0"));
        }
        if current_jackpot_amount.amount() < Decimal::ZERO {
            return Err(DomainError::validation("currentJackpotAmount must be >= 0"));
        }
        if !contribution_amount.is_less_than(&stake_amount)? {
            return Err(DomainError::validation(
                "contributionAmount must be less than stakeAmount",
            ));
        }
        // Comparison above already pinned contribution to the stake currency.
        if !current_jackpot_amount.has_same_currency_as(&stake_amount) {
            return Err(DomainError::CurrencyMismatch {
                left: stake_amount.currency().to_string(),
                right: current_jackpot_amount.currency().to_string(),
            });
        }

        Ok(Self {
            bet_id,
            user_id,
            jackpot_id: jackpot_cycle.jackpot_id,
            cycle: jackpot_cycle.cycle,
            stake_amount,
            contribution_amount,
            current_jackpot_amount,
            created_at,
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

    pub fn cycle(&self) -> CycleNumber {
        self.cycle
    }

    pub fn stake_amount(&self) -> Money {
        self.stake_amount
    }

    pub fn contribution_amount(&self) -> Money {
        self.contribution_amount
    }

    /// Pool after this contribution was added
    pub fn current_jackpot_amount(&self) -> Money {
        self.current_jackpot_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
