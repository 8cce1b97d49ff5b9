/// Shared constants for the jackpot services
///
/// This module centralizes the numeric precision rules and defaults
/// so that the backend, the processor, and the domain agree on them.

/// Scale every Money amount is stored at (cents)
pub const MONEY_SCALE: u32 = 2;

/// Scale of a percentage converted to a fraction
///
/// Rationale: the fraction is truncated, never rounded, so that a rate or
/// probability is never rounded up.
pub const PROBABILITY_SCALE: u32 = 8;

/// Scale of the pool position ratio used by the variable chance evaluator
pub const CHANCE_RATIO_SCALE: u32 = 10;

/// Length of a hyphenated UUID identifier
pub const ID_LENGTH: usize = 36;

/// Length of an ISO-4217 currency code
pub const CURRENCY_CODE_LENGTH: usize = 3;

/// First cycle number of a freshly configured jackpot
pub const FIRST_CYCLE: u32 = 1;

/// Default Redis stream carrying placed bets
pub const DEFAULT_BET_STREAM: &str = "jackpot:bets";

/// Default consumer group of the bet processors
pub const DEFAULT_CONSUMER_GROUP: &str = "jackpot-bet-processing";

/// Maximum optimistic-concurrency retries for one bet
pub const MAX_PROCESSING_RETRIES: u32 = 5;
