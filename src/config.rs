//! Engine configuration.
//!
//! # Examples
//!
//! ```
//! use form_merge::EngineConfig;
//!
//! let config = EngineConfig::default().with_concurrency_window_ms(250);
//! assert_eq!(config.history_capacity, 1000);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Default window within which edits from different actors count as concurrent.
pub const DEFAULT_CONCURRENCY_WINDOW_MS: i64 = 100;

/// Default number of resolved operations kept per form.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Default age after which resolved operations are evicted (one hour).
pub const DEFAULT_HISTORY_MAX_AGE_MS: i64 = 60 * 60 * 1000;

/// Tunables of the conflict-resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum timestamp distance, inclusive, for two operations to be concurrent
    pub concurrency_window_ms: i64,

    /// Per-form history cap; the oldest entries are dropped beyond it
    pub history_capacity: usize,

    /// Age used by age-based history cleanup
    pub history_max_age_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_window_ms: DEFAULT_CONCURRENCY_WINDOW_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_max_age_ms: DEFAULT_HISTORY_MAX_AGE_MS,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the concurrency window.
    #[must_use]
    pub fn with_concurrency_window_ms(mut self, window_ms: i64) -> Self {
        self.concurrency_window_ms = window_ms;
        self
    }

    /// Set the per-form history cap.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the age used by age-based cleanup.
    #[must_use]
    pub fn with_history_max_age_ms(mut self, max_age_ms: i64) -> Self {
        self.history_max_age_ms = max_age_ms;
        self
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency_window_ms < 0 {
            return Err(ResolveError::Config(format!(
                "concurrencyWindowMs must be >= 0, got {}",
                self.concurrency_window_ms
            )));
        }
        if self.history_capacity == 0 {
            return Err(ResolveError::Config(
                "historyCapacity must be at least 1".to_string(),
            ));
        }
        if self.history_max_age_ms < 0 {
            return Err(ResolveError::Config(format!(
                "historyMaxAgeMs must be >= 0, got {}",
                self.history_max_age_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.concurrency_window_ms, 100);
        assert_eq!(config.history_capacity, 1000);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json_str(r#"{"historyCapacity": 50}"#).unwrap();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.concurrency_window_ms, DEFAULT_CONCURRENCY_WINDOW_MS);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = EngineConfig::from_json_str(r#"{"historyCapacity": 0}"#);
        assert!(matches!(result, Err(ResolveError::Config(_))));
    }

    #[test]
    fn test_rejects_negative_window() {
        let config = EngineConfig::default().with_concurrency_window_ms(-1);
        assert!(config.validate().is_err());
    }
}
