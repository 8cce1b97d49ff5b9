//! Redis Lua scripts for atomic jackpot updates
//!
//! Every script reads the jackpot's `version` field and only writes when it
//! still equals the version the caller loaded. Successful writes bump the
//! version with HINCRBY and return the new value, which is always >= 1, so
//! 0 and negative results are free to signal rejections.

/// Jackpot missing
pub const MISSING: i64 = -2;

/// Contribution for the bet already stored
pub const DUPLICATE_CONTRIBUTION: i64 = -1;

/// Reward for the bet already stored
pub const DUPLICATE_REWARD: i64 = -3;

/// Stored version differs from the expected one
pub const VERSION_CONFLICT: i64 = 0;

/// Compare-and-set of a jackpot's mutable state
///
/// Keys: [jackpot_key]
/// Args: [expected_version, current_amount, cycle]
///
/// Returns: new version, VERSION_CONFLICT or MISSING
pub const SAVE_JACKPOT_SCRIPT: &str = r#"
local version = redis.call('HGET', KEYS[1], 'version')
if not version then
    return -2
end
if tonumber(version) ~= tonumber(ARGV[1]) then
    return 0
end

redis.call('HSET', KEYS[1], 'current_amount', ARGV[2], 'cycle', ARGV[3])
return redis.call('HINCRBY', KEYS[1], 'version', 1)
"#;

/// Settle one bet: jackpot state, contribution and optional reward together
///
/// Keys: [jackpot_key, contribution_key, reward_key]
/// Args: [expected_version, current_amount, cycle, contribution_json, reward_json]
///
/// An empty reward_json means the bet lost.
///
/// Returns: new version, DUPLICATE_CONTRIBUTION, DUPLICATE_REWARD,
/// VERSION_CONFLICT or MISSING
pub const COMMIT_SETTLEMENT_SCRIPT: &str = r#"
local version = redis.call('HGET', KEYS[1], 'version')
if not version then
    return -2
end
-- Duplicate check first: a replayed bet must not look like a conflict.
if redis.call('EXISTS', KEYS[2]) == 1 then
    return -1
end
if tonumber(version) ~= tonumber(ARGV[1]) then
    return 0
end
local has_reward = ARGV[5] ~= ''
if has_reward and redis.call('EXISTS', KEYS[3]) == 1 then
    return -3
end

redis.call('HSET', KEYS[1], 'current_amount', ARGV[2], 'cycle', ARGV[3])
redis.call('SET', KEYS[2], ARGV[4])
if has_reward then
    redis.call('SET', KEYS[3], ARGV[5])
end
return redis.call('HINCRBY', KEYS[1], 'version', 1)
"#;

/// Create a jackpot at version 0 unless the key exists
///
/// Keys: [jackpot_key]
/// Args: [initial_amount, current_amount, currency, cycle, contribution_config, reward_config]
///
/// Returns: 1 if created, 0 if already present
pub const CREATE_JACKPOT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end

redis.call('HSET', KEYS[1],
    'initial_amount', ARGV[1],
    'current_amount', ARGV[2],
    'currency', ARGV[3],
    'cycle', ARGV[4],
    'contribution_config', ARGV[5],
    'reward_config', ARGV[6],
    'version', 0
)
return 1
"#;
