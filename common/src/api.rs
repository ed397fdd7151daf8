pub mod paypal;
pub mod pcm;
pub mod test_payment_api;
pub mod test_print_api;
pub mod token_cache;

use serde_json::Value;

/// First non-empty string (or number rendered as a string) under any of `keys`.
pub fn first_string(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match payload.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
