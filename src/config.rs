//! Engine configuration
//!
//! Plain data handed to `Document::load_with`. Nothing here is read from the
//! environment; the CLI loads it from an optional JSON file.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Tunables for loading, editing and validating documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of units whose previous revision is retained for undo
    pub history_capacity: usize,

    /// Maximum number of differing ranges reported by the round-trip validator
    pub max_diffs: usize,

    /// Reject `<file>` elements without a `target-language` attribute
    pub require_target_language: bool,

    /// Length change (percent of source) above which a target is flagged
    pub expansion_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            history_capacity: 256,
            max_diffs: 16,
            require_target_language: false,
            expansion_threshold: 20.0,
        }
    }
}

impl EngineConfig {
    /// History capacity clamped to at least one entry
    pub fn history_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.history_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Parse a configuration from JSON text. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_capacity, 256);
        assert_eq!(config.max_diffs, 16);
        assert!(!config.require_target_language);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"max_diffs": 3}"#).unwrap();
        assert_eq!(config.max_diffs, 3);
        assert_eq!(config.history_capacity, 256);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let config = EngineConfig { history_capacity: 0, ..Default::default() };
        assert_eq!(config.history_capacity().get(), 1);
    }
}
