/// Insert a bet hash and index it unless the bet id is taken
///
/// Keys: [bet_key, user_index]
/// Args: [created_at_ms, bet_id, field1, value1, field2, value2, ...]
///
/// Returns: 1 if inserted, 0 if the bet already existed
pub const SAVE_BET_SCRIPT: &str = r#"
local bet_key = KEYS[1]
local user_index = KEYS[2]

if redis.call('EXISTS', bet_key) == 1 then
  return 0
end

redis.call('HSET', bet_key, unpack(ARGV, 3))
redis.call('ZADD', user_index, tonumber(ARGV[1]), ARGV[2])
return 1
"#;
