//! Error types for the conflict-resolution engine.
//!
//! Conflicting edits are never errors: they come back as [`Rejection`](crate::types::Rejection)
//! entries inside a [`Resolution`](crate::types::Resolution). [`ResolveError`] is only used at
//! the boundary where an inbound operation cannot be turned into a typed
//! [`Operation`](crate::types::Operation) at all, and for invalid configuration.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors raised before an operation reaches a resolution strategy.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The operation's `type` tag names a kind this engine does not know.
    #[error("unsupported operation type: {0}")]
    UnsupportedType(String),

    /// The operation is missing a field required for its kind, or is malformed.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Engine configuration is out of range.
    #[error("invalid config: {0}")]
    Config(String),
}

impl ResolveError {
    /// Stable machine-readable code, matching the rejection codes.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UnsupportedType(_) => "unsupported-type",
            ResolveError::InvalidOperation(_) | ResolveError::Json(_) => "invalid-operation",
            ResolveError::Config(_) => "invalid-config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ResolveError::UnsupportedType("move".into()).code(),
            "unsupported-type"
        );
        assert_eq!(
            ResolveError::InvalidOperation("missing fieldId".into()).code(),
            "invalid-operation"
        );
    }

    #[test]
    fn test_display() {
        let err = ResolveError::UnsupportedType("move".into());
        assert_eq!(err.to_string(), "unsupported operation type: move");
    }
}
