//! `{type, config}` configuration blobs for the jackpot strategies
//!
//! Jackpot definitions carry their contribution and reward strategies as
//! tagged JSON. The tag is matched case-insensitively and numeric parameters
//! may be given either as JSON strings or JSON numbers:
//!
//! ```json
//! {"type": "VARIABLE", "config": {"startingRate": "25", "minimumRate": 5, "decayFactor": "0.01"}}
//! {"type": "variable_chance", "config": {"minPercent": 10, "maxPercent": 60,
//!   "minPool": {"amount": "100", "currency": "EUR"}, "maxPool": {"amount": 200, "currency": "EUR"}}}
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::contribution::ContributionCalculator;
use crate::errors::{DomainError, Result};
use crate::money::{parse_decimal, Money};
use crate::percentage::{DecayFactor, Percentage};
use crate::reward::RewardEvaluator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: Value,
}

impl StrategyConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::InvalidConfig(format!("malformed strategy JSON: {}", e)))
    }

    pub fn to_json(&self) -> String {
        Value::from(self).to_string()
    }

    fn tag(&self) -> String {
        self.kind.trim().to_ascii_uppercase()
    }
}

impl From<&StrategyConfig> for Value {
    fn from(config: &StrategyConfig) -> Self {
        json!({ "type": config.kind, "config": config.config })
    }
}

impl TryFrom<&StrategyConfig> for ContributionCalculator {
    type Error = DomainError;

    fn try_from(config: &StrategyConfig) -> Result<Self> {
        let tag = config.tag();
        let params = Params::new(&tag, &config.config)?;
        let calculator = match tag.as_str() {
            "FIXED" => ContributionCalculator::fixed(params.percentage("rate")?),
            "VARIABLE" => ContributionCalculator::variable(
                params.percentage("startingRate")?,
                params.percentage("minimumRate")?,
                params.decay_factor("decayFactor")?,
            ),
            _ => {
                return Err(DomainError::InvalidConfig(format!(
                    "unknown contribution type: {}",
                    config.kind
                )))
            }
        };
        calculator.map_err(|e| params.wrap(e))
    }
}

impl TryFrom<&StrategyConfig> for RewardEvaluator {
    type Error = DomainError;

    fn try_from(config: &StrategyConfig) -> Result<Self> {
        let tag = config.tag();
        let params = Params::new(&tag, &config.config)?;
        let evaluator = match tag.as_str() {
            "FIXED_CHANCE" => RewardEvaluator::fixed_chance(params.percentage("chancePercent")?),
            "VARIABLE_CHANCE" => RewardEvaluator::variable_chance(
                params.percentage("minPercent")?,
                params.percentage("maxPercent")?,
                params.money("minPool")?,
                params.money("maxPool")?,
            ),
            _ => {
                return Err(DomainError::InvalidConfig(format!(
                    "unknown reward type: {}",
                    config.kind
                )))
            }
        };
        evaluator.map_err(|e| params.wrap(e))
    }
}

impl From<&ContributionCalculator> for StrategyConfig {
    fn from(calculator: &ContributionCalculator) -> Self {
        let config = match calculator {
            ContributionCalculator::Fixed { rate } => json!({ "rate": rate.value().to_string() }),
            ContributionCalculator::Variable {
                starting_rate,
                minimum_rate,
                decay_factor,
            } => json!({
                "startingRate": starting_rate.value().to_string(),
                "minimumRate": minimum_rate.value().to_string(),
                "decayFactor": decay_factor.value().to_string(),
            }),
        };
        Self {
            kind: calculator.type_name().to_string(),
            config,
        }
    }
}

impl From<&RewardEvaluator> for StrategyConfig {
    fn from(evaluator: &RewardEvaluator) -> Self {
        let config = match evaluator {
            RewardEvaluator::FixedChance { chance } => {
                json!({ "chancePercent": chance.value().to_string() })
            }
            RewardEvaluator::VariableChance {
                min_percent,
                max_percent,
                min_pool,
                max_pool,
            } => json!({
                "minPercent": min_percent.value().to_string(),
                "maxPercent": max_percent.value().to_string(),
                "minPool": money_value(min_pool),
                "maxPool": money_value(max_pool),
            }),
        };
        Self {
            kind: evaluator.type_name().to_string(),
            config,
        }
    }
}

fn money_value(money: &Money) -> Value {
    json!({ "amount": money.amount().to_string(), "currency": money.currency().as_str() })
}

/// Named parameters of one strategy blob
struct Params<'a> {
    tag: &'a str,
    fields: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    fn new(tag: &'a str, config: &'a Value) -> Result<Self> {
        match config {
            Value::Object(fields) => Ok(Self { tag, fields }),
            other => Err(DomainError::InvalidConfig(format!(
                "{}: config must be an object, got {}",
                tag, other
            ))),
        }
    }

    fn wrap(&self, error: DomainError) -> DomainError {
        DomainError::InvalidConfig(format!("{}: {}", self.tag, error))
    }

    fn field(&self, name: &str) -> Result<&'a Value> {
        self.fields
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| DomainError::InvalidConfig(format!("{}: missing {}", self.tag, name)))
    }

    fn decimal(&self, name: &str) -> Result<Decimal> {
        decimal_literal(self.field(name)?)
            .ok_or_else(|| DomainError::InvalidConfig(format!("{}: {} is not a decimal", self.tag, name)))
    }

    fn percentage(&self, name: &str) -> Result<Percentage> {
        Percentage::new(self.decimal(name)?).map_err(|e| self.wrap(e))
    }

    fn decay_factor(&self, name: &str) -> Result<DecayFactor> {
        DecayFactor::new(self.decimal(name)?).map_err(|e| self.wrap(e))
    }

    fn money(&self, name: &str) -> Result<Money> {
        let invalid = || DomainError::InvalidConfig(format!("{}: {} must be {{amount, currency}}", self.tag, name));
        let object = self.field(name)?.as_object().ok_or_else(invalid)?;
        let amount = object.get("amount").and_then(decimal_literal).ok_or_else(invalid)?;
        let currency = object.get("currency").and_then(Value::as_str).ok_or_else(invalid)?;
        Money::of(&amount.to_string(), currency).map_err(|e| self.wrap(e))
    }
}

fn decimal_literal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}
