//! Codec Configuration
//!
//! Decode/encode policy loaded from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::header::PFCP_MANDATORY_LEN;
use crate::ie::MAX_IE_PAYLOAD_LEN;

/// Largest message the 16-bit length field can describe
pub const MAX_MESSAGE_LEN: usize = MAX_IE_PAYLOAD_LEN + PFCP_MANDATORY_LEN;

/// Default nesting depth for diagnostic dumps
pub const DEFAULT_MAX_DUMP_DEPTH: usize = 8;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Codec configuration
///
/// ```yaml
/// strict_version: true
/// max_message_len: 65539
/// max_dump_depth: 8
/// strip_digit_filler: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Reject headers whose version is not 1
    pub strict_version: bool,
    /// Upper bound on a whole message, header included
    pub max_message_len: usize,
    /// Nesting cap for `dump`
    pub max_dump_depth: usize,
    /// Drop the 0xF filler nibble when decoding User ID digits
    pub strip_digit_filler: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            strict_version: true,
            max_message_len: MAX_MESSAGE_LEN,
            max_dump_depth: DEFAULT_MAX_DUMP_DEPTH,
            strip_digit_filler: true,
        }
    }
}

impl CodecConfig {
    /// Parse YAML from a string; missing keys take their defaults.
    pub fn from_yaml(yaml_str: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig =
            serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_len < crate::header::PFCP_HEADER_LEN {
            return Err(ConfigError::ValidationError(format!(
                "`max_message_len` {} is below the 8-octet header",
                self.max_message_len
            )));
        }
        if self.max_message_len > MAX_MESSAGE_LEN {
            return Err(ConfigError::ValidationError(format!(
                "`max_message_len` {} exceeds {}",
                self.max_message_len, MAX_MESSAGE_LEN
            )));
        }
        if self.max_dump_depth == 0 {
            return Err(ConfigError::ValidationError(
                "`max_dump_depth` must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert!(config.strict_version);
        assert_eq!(config.max_message_len, 65539);
        assert_eq!(config.max_dump_depth, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = CodecConfig::from_yaml("strict_version: false\nmax_dump_depth: 3\n").unwrap();
        assert!(!config.strict_version);
        assert_eq!(config.max_dump_depth, 3);
        assert_eq!(config.max_message_len, MAX_MESSAGE_LEN);
        assert!(config.strip_digit_filler);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = CodecConfig { max_message_len: 1500, ..Default::default() };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(CodecConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            CodecConfig::from_yaml("max_message_len: 4"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            CodecConfig::from_yaml("max_message_len: 70000"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            CodecConfig::from_yaml("max_dump_depth: 0"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            CodecConfig::from_yaml("strict_version: [1, 2]"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CodecConfig::from_file("/nonexistent/pfcp-codec.yaml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
