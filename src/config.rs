use crate::domain::funds::{Amount, DEFAULT_FUNDING_THRESHOLD};
use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Registered-airline count below which existing airlines admit new ones
/// without a vote.
pub const DEFAULT_BOOTSTRAP_THRESHOLD: usize = 4;

/// Tunable registry parameters. Defaults reproduce the deployed network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Minimum cumulative balance, in ether, for an airline to count as funded.
    pub funding_threshold: Amount,
    /// See [`DEFAULT_BOOTSTRAP_THRESHOLD`].
    pub bootstrap_threshold: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            funding_threshold: DEFAULT_FUNDING_THRESHOLD,
            bootstrap_threshold: DEFAULT_BOOTSTRAP_THRESHOLD,
        }
    }
}

impl RegistryConfig {
    /// Loads a JSON configuration file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| RegistryError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bootstrap_threshold == 0 {
            return Err(RegistryError::ConfigError(
                "bootstrap_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
