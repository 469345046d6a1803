//! Content keys for import records.
//!
//! An etag is a SHA-256 digest over the canonical JSON form of a record,
//! truncated to 128 bits. Canonical JSON is the record as a
//! [`serde_json::Value`] with every object's keys sorted, rendered without
//! whitespace. Two records therefore share an etag exactly when they are
//! structurally equal, nested records included.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept in an etag.
const ETAG_BYTES: usize = 16;

/// Content hash of an import record.
///
/// Only meaningful within one reconciliation call; it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Etag(String);

impl Etag {
    /// Computes the etag of any serializable value.
    ///
    /// # Panics
    ///
    /// Panics if `value` cannot be represented as JSON, which only happens
    /// for maps with non-string keys. Import records never contain those.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Self {
        let canonical = canonical_json(value).expect("import records serialize to JSON");
        let digest = Sha256::digest(canonical.as_bytes());
        let mut hex = String::with_capacity(ETAG_BYTES * 2);
        for byte in &digest[..ETAG_BYTES] {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders `value` as compact JSON with object keys in sorted order.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let value = sort_keys(serde_json::to_value(value)?);
    serde_json::to_string(&value)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
