//! Reward strategies, the random source they draw from, and the reward record

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants::CHANCE_RATIO_SCALE;
use crate::errors::{DomainError, Result};
use crate::money::Money;
use crate::percentage::Percentage;
use crate::types::{BetId, CycleNumber, JackpotCycle, JackpotId, UserId};

/// Source of uniform samples in `[0, 1)`
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Thread-local generator used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the same draw
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub f64);

impl RandomSource for FixedDraw {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// Input of a reward evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardContext {
    current_pool: Money,
}

impl RewardContext {
    pub fn new(current_pool: Money) -> Result<Self> {
        if !current_pool.is_positive() {
            return Err(DomainError::validation("currentPool must be > 0"));
        }
        Ok(Self { current_pool })
    }

    pub fn current_pool(&self) -> Money {
        self.current_pool
    }
}

/// Decides whether a bet wins the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardEvaluator {
    /// Constant probability per bet
    FixedChance { chance: Percentage },

    /// Probability rising linearly from `min_percent` at `min_pool` to
    /// `max_percent` at `max_pool`; a pool at or above `max_pool` always wins
    VariableChance {
        min_percent: Percentage,
        max_percent: Percentage,
        min_pool: Money,
        max_pool: Money,
    },
}

impl RewardEvaluator {
    pub fn fixed_chance(chance: Percentage) -> Result<Self> {
        if chance.is_zero() {
            return Err(DomainError::validation("chancePercent must be > 0"));
        }
        Ok(Self::FixedChance { chance })
    }

    pub fn variable_chance(
        min_percent: Percentage,
        max_percent: Percentage,
        min_pool: Money,
        max_pool: Money,
    ) -> Result<Self> {
        if min_percent.is_hundred() {
            return Err(DomainError::validation("minPercent must be < 100%"));
        }
        if min_percent >= max_percent {
            return Err(DomainError::validation("minPercent must be < maxPercent"));
        }
        if !min_pool.is_positive() {
            return Err(DomainError::validation("minPool must be > 0"));
        }
        if !max_pool.is_positive() {
            return Err(DomainError::validation("maxPool must be > 0"));
        }
        if !min_pool.has_same_currency_as(&max_pool) {
            return Err(DomainError::CurrencyMismatch {
                left: min_pool.currency().to_string(),
                right: max_pool.currency().to_string(),
            });
        }
        if max_pool.is_less_than(&min_pool)? {
            return Err(DomainError::validation("maxPool must be >= minPool"));
        }
        Ok(Self::VariableChance {
            min_percent,
            max_percent,
            min_pool,
            max_pool,
        })
    }

    /// Decide the outcome for the given pool
    ///
    /// `random` is only consulted when the outcome is uncertain.
    pub fn evaluate(&self, ctx: &RewardContext, random: &dyn RandomSource) -> Result<bool> {
        let chance = match self {
            Self::FixedChance { chance } => {
                if chance.is_hundred() {
                    return Ok(true);
                }
                *chance
            }
            Self::VariableChance {
                min_percent,
                max_percent,
                min_pool,
                max_pool,
            } => {
                let current = ctx.current_pool();
                for bound in [min_pool, max_pool] {
                    if !current.has_same_currency_as(bound) {
                        return Err(DomainError::CurrencyMismatch {
                            left: current.currency().to_string(),
                            right: bound.currency().to_string(),
                        });
                    }
                }

                if current.is_greater_than_or_equal(max_pool)? {
                    return Ok(true);
                }
                if current.is_less_than_or_equal(min_pool)? {
                    *min_percent
                } else {
                    let position = current.minus(min_pool)?.amount();
                    let span = max_pool.minus(min_pool)?.amount();
                    let ratio = (position / span)
                        .round_dp_with_strategy(CHANCE_RATIO_SCALE, RoundingStrategy::ToZero);
                    min_percent.plus(max_percent.minus(*min_percent).times(ratio)?)
                }
            }
        };

        Ok(wins(random.next_f64(), chance))
    }

    /// Configuration tag of this variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::FixedChance { .. } => "FIXED_CHANCE",
            Self::VariableChance { .. } => "VARIABLE_CHANCE",
        }
    }
}

/// A draw wins when it falls strictly below the chance
fn wins(draw: f64, chance: Percentage) -> bool {
    let threshold = chance
        .fractional_value()
        .to_f64()
        .unwrap_or_else(|| if chance.value() > Decimal::ZERO { 1.0 } else { 0.0 });
    draw < threshold
}

/// Payout granted to a winning bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JackpotReward {
    bet_id: BetId,
    user_id: UserId,
    jackpot_id: JackpotId,
    cycle: CycleNumber,
    reward_amount: Money,
    created_at: DateTime<Utc>,
}

impl JackpotReward {
    pub fn new(
        bet_id: BetId,
        user_id: UserId,
        jackpot_cycle: JackpotCycle,
        reward_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if !reward_amount.is_positive() {
            return Err(DomainError::validation("rewardAmount must be positive"));
        }
        Ok(Self {
            bet_id,
            user_id,
            jackpot_id: jackpot_cycle.jackpot_id,
            cycle: jackpot_cycle.cycle,
            reward_amount,
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

    pub fn reward_amount(&self) -> Money {
        self.reward_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed draw that records how often it was consulted
    struct CountingDraw {
        draw: f64,
        calls: AtomicUsize,
    }

    impl CountingDraw {
        fn new(draw: f64) -> Self {
            Self {
                draw,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RandomSource for CountingDraw {
        fn next_f64(&self) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.draw
        }
    }

    fn eur(amount: &str) -> Money {
        Money::of(amount, "EUR").unwrap()
    }

    fn pct(value: &str) -> Percentage {
        Percentage::of(value).unwrap()
    }

    fn pool(amount: &str) -> RewardContext {
        RewardContext::new(eur(amount)).unwrap()
    }

    fn variable(min: &str, max: &str, min_pool: &str, max_pool: &str) -> RewardEvaluator {
        RewardEvaluator::variable_chance(pct(min), pct(max), eur(min_pool), eur(max_pool)).unwrap()
    }

    #[test]
    fn test_reward_context_requires_positive_pool() {
        assert!(RewardContext::new(eur("0")).is_err());
        assert!(RewardContext::new(eur("-5")).is_err());
    }

    #[test]
    fn test_fixed_chance_rejects_zero() {
        assert!(RewardEvaluator::fixed_chance(Percentage::ZERO).is_err());
    }

    #[test]
    fn test_fixed_chance_hundred_never_samples() {
        let evaluator = RewardEvaluator::fixed_chance(Percentage::HUNDRED).unwrap();
        let random = CountingDraw::new(0.999);

        for _ in 0..10 {
            assert!(evaluator.evaluate(&pool("100"), &random).unwrap());
        }
        assert_eq!(random.calls(), 0);
    }

    #[test]
    fn test_fixed_chance_compares_strictly() {
        let evaluator = RewardEvaluator::fixed_chance(pct("10")).unwrap();
        assert!(evaluator.evaluate(&pool("100"), &FixedDraw(0.0999999)).unwrap());
        assert!(!evaluator.evaluate(&pool("100"), &FixedDraw(0.1)).unwrap());
    }

    #[test]
    fn test_variable_chance_constructor_rules() {
        let cases = [
            ("100", "100", "100", "200", "minPercent must be < 100%"),
            ("60", "10", "100", "200", "minPercent must be < maxPercent"),
            ("10", "10", "100", "200", "minPercent must be < maxPercent"),
            ("10", "60", "0", "200", "minPool must be > 0"),
            ("10", "60", "100", "0", "maxPool must be > 0"),
            ("10", "60", "200", "100", "maxPool must be >= minPool"),
        ];
        for (min, max, min_pool, max_pool, message) in cases {
            let err = RewardEvaluator::variable_chance(pct(min), pct(max), eur(min_pool), eur(max_pool))
                .unwrap_err();
            assert_eq!(err.to_string(), message);
        }

        let mixed = RewardEvaluator::variable_chance(
            pct("10"),
            pct("60"),
            eur("100"),
            Money::of("200", "USD").unwrap(),
        );
        assert!(matches!(mixed, Err(DomainError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_variable_chance_at_or_above_max_pool_never_samples() {
        let evaluator = variable("10", "60", "100", "200");
        let random = CountingDraw::new(0.999);

        assert!(evaluator.evaluate(&pool("200"), &random).unwrap());
        assert!(evaluator.evaluate(&pool("250"), &random).unwrap());
        assert_eq!(random.calls(), 0);
    }

    #[test]
    fn test_variable_chance_minimum_region() {
        let evaluator = variable("12.5", "60", "100", "200");
        assert!(evaluator.evaluate(&pool("50"), &FixedDraw(0.1249999)).unwrap());
        assert!(!evaluator.evaluate(&pool("50"), &FixedDraw(0.125)).unwrap());
        // The minimum pool itself still uses the minimum chance.
        assert!(!evaluator.evaluate(&pool("100"), &FixedDraw(0.125)).unwrap());
    }

    #[test]
    fn test_variable_chance_interpolates() {
        let evaluator = variable("10", "60", "100", "200");

        // Midway: 10 + 50 * 0.5 = 35%
        assert!(!evaluator.evaluate(&pool("150"), &FixedDraw(0.35)).unwrap());
        assert!(evaluator.evaluate(&pool("150"), &FixedDraw(0.349999)).unwrap());

        // 10 + 50 * 0.33 = 26.5%
        assert!(!evaluator.evaluate(&pool("133"), &FixedDraw(0.265)).unwrap());
        assert!(evaluator.evaluate(&pool("133"), &FixedDraw(0.2649999)).unwrap());
    }

    #[test]
    fn test_variable_chance_zero_minimum_cannot_win_at_low_pool() {
        let evaluator = RewardEvaluator::variable_chance(
            Percentage::ZERO,
            pct("60"),
            eur("100"),
            eur("200"),
        )
        .unwrap();
        assert!(!evaluator.evaluate(&pool("50"), &FixedDraw(0.0)).unwrap());
        assert!(!evaluator.evaluate(&pool("50"), &FixedDraw(1.0)).unwrap());
    }

    #[test]
    fn test_variable_chance_rejects_foreign_pool() {
        let evaluator = variable("10", "60", "100", "200");
        let usd = RewardContext::new(Money::of("150", "USD").unwrap()).unwrap();
        assert!(matches!(
            evaluator.evaluate(&usd, &FixedDraw(0.0)),
            Err(DomainError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_thread_random_is_in_unit_interval() {
        for _ in 0..1_000 {
            let draw = ThreadRandom.next_f64();
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[test]
    fn test_reward_must_be_positive() {
        let cycle = JackpotCycle::new(JackpotId::new(), CycleNumber::FIRST);
        assert!(JackpotReward::new(BetId::new(), UserId::new(), cycle, eur("0"), Utc::now()).is_err());
        let reward =
            JackpotReward::new(BetId::new(), UserId::new(), cycle, eur("121"), Utc::now()).unwrap();
        assert_eq!(reward.reward_amount(), eur("121"));
    }
}
