//! Cache key derivation.
//!
//! Query results live under [`CHARACTERS_PREFIX`] followed by the stable JSON
//! form of the filter that produced them, so every entry can be dropped with a
//! single prefix invalidation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Namespace shared by every cached character query.
pub const CHARACTERS_PREFIX: &str = "characters:";

/// Serialize a JSON value with its top-level object keys sorted.
///
/// Non-object values (null, numbers, strings, arrays) serialize as-is.
pub fn stable_serialize(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            // A map of `String` keys to `Value`s always serializes.
            serde_json::to_string(&sorted).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

/// Build the cache key for a query described by `filter`.
pub fn query_key<T: Serialize + ?Sized>(
    prefix: &str,
    filter: &T,
) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(filter)?;
    Ok(format!("{prefix}{}", stable_serialize(&value)))
}

/// Cache key for a character listing query.
pub fn character_query_key<T: Serialize + ?Sized>(filter: &T) -> Result<String, serde_json::Error> {
    query_key(CHARACTERS_PREFIX, filter)
}
