//! Canonical serialization and integrity digests for checkpoint state.
//!
//! State is normalized to a `serde_json::Value` with object keys sorted
//! recursively, so the same logical state always produces the same bytes and
//! therefore the same digest, regardless of how the map type orders keys.

use crate::error::MigrationResult;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Convert any serializable state into its canonical JSON value
pub fn canonical_value<S: Serialize + ?Sized>(state: &S) -> MigrationResult<Value> {
    Ok(sort_keys(serde_json::to_value(state)?))
}

/// Canonical byte encoding of an already-canonical value
pub fn canonical_bytes(value: &Value) -> MigrationResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Hex-encoded SHA-256 of the canonical encoding
pub fn state_digest(value: &Value) -> MigrationResult<String> {
    let bytes = canonical_bytes(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_key_order_does_not_affect_digest() {
        let mut first = HashMap::new();
        let mut second = HashMap::new();
        for (k, v) in [("table", "users"), ("column", "email"), ("step", "3")] {
            first.insert(k, v);
        }
        for (k, v) in [("step", "3"), ("table", "users"), ("column", "email")] {
            second.insert(k, v);
        }

        let a = state_digest(&canonical_value(&first).unwrap()).unwrap();
        let b = state_digest(&canonical_value(&second).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nested_keys_sorted() {
        let value =
            canonical_value(&json!({"b": {"z": 1, "a": 2}, "a": [{"y": 0, "x": 1}]})).unwrap();
        let encoded = String::from_utf8(canonical_bytes(&value).unwrap()).unwrap();
        assert_eq!(encoded, r#"{"a":[{"x":1,"y":0}],"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn test_digest_changes_with_state() {
        let a = state_digest(&json!({"applied": 1})).unwrap();
        let b = state_digest(&json!({"applied": 2})).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
