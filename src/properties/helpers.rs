//! # Service Property Helpers
//!
//! Accessors for the loosely-typed service property maps providers hand to the
//! aggregation and tracking layers. Values for recognized capability keys
//! follow the string-plus convention: a single string or an array of strings,
//! always treated as a deduplicated set.

use crate::constants::properties;
use crate::error::{Result, SchemaHubError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Loosely-typed property map attached to providers and tracked registries
pub type ServiceProperties = HashMap<String, Value>;

/// Read the provider id from a property map, if present
pub fn provider_id(props: &ServiceProperties) -> Option<u64> {
    match props.get(properties::PROVIDER_ID)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read the mandatory provider id, failing fast when it is absent or malformed
pub fn require_provider_id(props: &ServiceProperties) -> Result<u64> {
    provider_id(props).ok_or_else(|| {
        SchemaHubError::PropertyError(format!(
            "Service properties must contain a '{}' entry with a 64-bit value",
            properties::PROVIDER_ID
        ))
    })
}

/// Read a string-plus value (string or array of strings) as a set.
/// Returns `None` when the key is absent; non-string array elements are
/// ignored.
pub fn string_plus(props: &ServiceProperties, key: &str) -> Option<HashSet<String>> {
    match props.get(key)? {
        Value::String(s) => Some(HashSet::from([s.clone()])),
        Value::Array(values) => Some(
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

/// Write a value set under a key as a sorted string array, so rendered
/// property maps are deterministic
pub fn insert_string_set(props: &mut ServiceProperties, key: &str, values: &HashSet<String>) {
    let mut sorted: Vec<&String> = values.iter().collect();
    sorted.sort();
    props.insert(
        key.to_string(),
        Value::Array(sorted.into_iter().map(|v| Value::String(v.clone())).collect()),
    );
}
