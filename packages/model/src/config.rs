use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Model configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelConfig {
    /// Undo levels kept; 0 keeps every batch
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Correcting post-fixer passes allowed per batch before it is rejected.
    /// The closing pass that finds nothing to fix is not counted.
    #[serde(default = "default_max_post_fixer_passes")]
    pub max_post_fixer_passes: usize,
}

fn default_history_depth() -> usize {
    100
}

fn default_max_post_fixer_passes() -> usize {
    32
}

impl ModelConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_post_fixer_passes == 0 {
            return Err(ConfigError::Zero {
                field: "maxPostFixerPasses",
            });
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            history_depth: default_history_depth(),
            max_post_fixer_passes: default_max_post_fixer_passes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = ModelConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ModelConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = ModelConfig::from_json_str(r#"{ "historyDepth": 5 }"#).unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.max_post_fixer_passes, 32);
    }

    #[test]
    fn test_zero_passes_rejected() {
        let result = ModelConfig::from_json_str(r#"{ "maxPostFixerPasses": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Zero { .. })));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = ModelConfig::from_json_str(r#"{ "historyDeph": 5 }"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
