//! # Canonical Serialization
//!
//! This module defines [`CanonicalBytes`], the sole construction path for
//! bytes used as signing input and in digest computation across the stack.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct
//! `CanonicalBytes` is through [`CanonicalBytes::new()`] or
//! [`CanonicalBytes::from_value()`], which apply the full coercion pipeline
//! before serialization. Signer and verifier therefore always agree on the
//! exact byte form of a document — a non-matching canonicalization is the
//! one place an implementation silently breaks interoperability.
//!
//! ## Coercion Rules
//!
//! 1. Reject floats — amounts and counters must be strings or integers.
//! 2. Normalize RFC 3339 datetimes to UTC with `Z` suffix, truncated to
//!    seconds.
//! 3. Sort object keys lexicographically.
//! 4. Use compact separators (no whitespace).

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by sorted-key JSON canonicalization.
///
/// The inner `Vec<u8>` is private — downstream code cannot construct
/// `CanonicalBytes` except through the constructors in this module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// This is the ONLY way to produce signing input in the stack. All
    /// signature and digest computation must flow through this constructor
    /// (or [`CanonicalBytes::from_value()`] for pre-built JSON values).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    ///
    /// Used by signing paths that need to strip a field (the `proof`)
    /// before canonicalization.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let coerced = coerce_json_value(value)?;
        // serde_json::Map is a BTreeMap in its default configuration, so
        // object keys come out sorted; `to_vec` is compact by construction.
        let bytes = serde_json::to_vec(&coerced)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for signing or digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively coerce JSON values according to the canonicalization rules.
fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if n.is_f64() && !n.is_i64() && !n.is_u64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(Value::Number(n))
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
        Value::String(s) => {
            // Datetime normalization: any string that parses as RFC 3339 is
            // rewritten as UTC with Z suffix, truncated to seconds.
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                let utc = dt.with_timezone(&chrono::Utc);
                Ok(Value::String(utc.format("%Y-%m-%dT%H:%M:%SZ").to_string()))
            } else {
                Ok(Value::String(s))
            }
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_bytes_sorts_keys() {
        let c = CanonicalBytes::new(&json!({"b": 1, "a": 2, "c": 3})).unwrap();
        assert_eq!(c.as_bytes(), br#"{"a":2,"b":1,"c":3}"#);
    }

    #[test]
    fn canonical_bytes_is_deterministic() {
        let v = json!({"zeta": [1, 2], "alpha": {"y": "x", "a": "b"}});
        let c1 = CanonicalBytes::new(&v).unwrap();
        let c2 = CanonicalBytes::new(&v).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn canonical_bytes_rejects_floats() {
        let result = CanonicalBytes::new(&json!({"amount": 1.5}));
        assert!(matches!(
            result,
            Err(CanonicalizationError::FloatRejected(_))
        ));
    }

    #[test]
    fn canonical_bytes_rejects_nested_floats() {
        let result = CanonicalBytes::new(&json!({"outer": {"inner": [0.1]}}));
        assert!(result.is_err());
    }

    #[test]
    fn canonical_bytes_accepts_integers() {
        let c = CanonicalBytes::new(&json!({"count": 42, "neg": -7})).unwrap();
        assert_eq!(c.as_bytes(), br#"{"count":42,"neg":-7}"#);
    }

    #[test]
    fn datetime_strings_normalized_to_utc_seconds() {
        let c = CanonicalBytes::new(&json!({"at": "2026-03-18T19:23:24.123+05:00"})).unwrap();
        assert_eq!(c.as_bytes(), br#"{"at":"2026-03-18T14:23:24Z"}"#);
    }

    #[test]
    fn non_datetime_strings_pass_through() {
        let c = CanonicalBytes::new(&json!({"name": "hello world"})).unwrap();
        assert_eq!(c.as_bytes(), br#"{"name":"hello world"}"#);
    }

    #[test]
    fn compact_output_no_whitespace() {
        let c = CanonicalBytes::new(&json!({"a": [1, 2, 3]})).unwrap();
        let s = std::str::from_utf8(c.as_bytes()).unwrap();
        assert!(!s.contains(' '));
    }

    #[test]
    fn from_value_matches_new() {
        let v = json!({"k": "v"});
        let c1 = CanonicalBytes::new(&v).unwrap();
        let c2 = CanonicalBytes::from_value(v).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn into_bytes_returns_inner() {
        let c = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(c.into_bytes(), b"{}".to_vec());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn insertion_order_never_changes_canonical_bytes(
                entries in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..8)
            ) {
                let forward = serde_json::Map::from_iter(
                    entries.iter().map(|(k, v)| (k.clone(), json!(v))),
                );
                let reverse = serde_json::Map::from_iter(
                    entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))),
                );
                let a = CanonicalBytes::new(&Value::Object(forward)).unwrap();
                let b = CanonicalBytes::new(&Value::Object(reverse)).unwrap();
                prop_assert_eq!(a, b);
            }

            #[test]
            fn canonicalization_is_idempotent(
                entries in proptest::collection::vec(("[a-z]{1,8}", "[ -~]{0,16}"), 0..8)
            ) {
                let map = serde_json::Map::from_iter(
                    entries.iter().map(|(k, v)| (k.clone(), json!(v))),
                );
                let once = CanonicalBytes::new(&Value::Object(map)).unwrap();
                let reparsed: Value = serde_json::from_slice(once.as_bytes()).unwrap();
                let twice = CanonicalBytes::new(&reparsed).unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
