//! # Error Hierarchy
//!
//! Structured error types for the VCL stack, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Each subsystem defines specific error variants that carry diagnostic
//! context: the operation that failed, the state at the time of failure,
//! and actionable information for operators.

use thiserror::Error;

/// Top-level error type for the VCL stack.
#[derive(Error, Debug)]
pub enum VclError {
    /// Canonicalization failure during signing or digest computation.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Domain primitive validation failure.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Cryptographic operation failure.
    #[error("cryptographic error: {0}")]
    Cryptographic(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitive newtypes.
///
/// Each identifier type enforces format constraints at construction time.
/// These errors carry the invalid input and the expected format so that
/// callers can diagnose malformed identifiers without guesswork.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// DID does not conform to W3C DID syntax (did:method:identifier).
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// A fixed-size hex identifier failed to parse.
    #[error("invalid {kind} identifier: \"{value}\" (expected 32 bytes as 64 hex chars, optional 0x prefix)")]
    InvalidHexId {
        /// The identifier kind (registry, blob, revoke).
        kind: &'static str,
        /// The string that failed to parse.
        value: String,
    },

    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vcl_error_canonicalization_display() {
        let inner = CanonicalizationError::FloatRejected(1.5);
        let err = VclError::Canonicalization(inner);
        assert!(format!("{err}").contains("canonicalization error"));
    }

    #[test]
    fn vcl_error_validation_display() {
        let inner = ValidationError::InvalidDid("bad:did".to_string());
        let err = VclError::Validation(inner);
        assert!(format!("{err}").contains("bad:did"));
    }

    #[test]
    fn canonicalization_error_float_rejected() {
        let err = CanonicalizationError::FloatRejected(3.14);
        let msg = format!("{err}");
        assert!(msg.contains("float values are not permitted"));
        assert!(msg.contains("3.14"));
    }

    #[test]
    fn validation_error_invalid_hex_id() {
        let err = ValidationError::InvalidHexId {
            kind: "registry",
            value: "zz".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("registry"));
        assert!(msg.contains("64 hex chars"));
    }

    #[test]
    fn validation_error_invalid_timestamp() {
        let err = ValidationError::InvalidTimestamp {
            value: "not-a-date".to_string(),
            reason: "parse failed".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("not-a-date"));
        assert!(msg.contains("parse failed"));
    }

    #[test]
    fn all_error_types_are_debug() {
        let e1 = VclError::Cryptographic("test".to_string());
        let e2 = CanonicalizationError::FloatRejected(0.0);
        let e3 = ValidationError::InvalidDid("x".to_string());
        assert!(!format!("{e1:?}").is_empty());
        assert!(!format!("{e2:?}").is_empty());
        assert!(!format!("{e3:?}").is_empty());
    }
}
