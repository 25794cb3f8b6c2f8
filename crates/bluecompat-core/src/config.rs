//! Compat layer configuration

use serde::{Deserialize, Serialize};

use crate::errors::{CompatError, Result};
use crate::types::ApiLevel;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Default discoverable duration used by the two-argument `set_scan_mode`
pub const DEFAULT_SCAN_DURATION_SECS: u32 = 120;

/// Configuration for the capability wrappers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Use this API level instead of the detected one
    pub api_level: Option<ApiLevel>,
    /// Discoverable duration applied when the caller gives none
    pub default_scan_duration_secs: u32,
    /// Include argument values in invocation failure logs
    pub log_arguments: bool,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            api_level: None,
            default_scan_duration_secs: DEFAULT_SCAN_DURATION_SECS,
            log_arguments: true,
        }
    }
}

impl CompatConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pin the runtime API level
    pub fn with_api_level(mut self, level: ApiLevel) -> Self {
        self.api_level = Some(level);
        self
    }

    /// Set the default discoverable duration
    pub fn with_default_scan_duration(mut self, secs: u32) -> Self {
        self.default_scan_duration_secs = secs;
        self
    }

    /// Enable or disable argument values in failure logs
    pub fn with_argument_logging(mut self, enabled: bool) -> Self {
        self.log_arguments = enabled;
        self
    }

    /// The level the wrappers dispatch on: the override if set, else `detected`
    pub fn effective_api_level(&self, detected: ApiLevel) -> ApiLevel {
        self.api_level.unwrap_or(detected)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_scan_duration_secs == 0 {
            return Err(CompatError::config_error(
                "default_scan_duration_secs must be greater than zero",
            ));
        }
        Ok(())
    }
}
