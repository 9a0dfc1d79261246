use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_CHECK_DELAY_MS: u64 = 3_000;
pub const MAX_CHECK_DELAY_MS: u64 = 600_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Check for application updates (packaged mode only)
    pub enabled: bool,
    /// Delay after startup before the first check
    pub check_delay_ms: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_delay_ms: DEFAULT_CHECK_DELAY_MS,
        }
    }
}

impl UpdateConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.check_delay_ms > MAX_CHECK_DELAY_MS {
            return Err(ConfigError::updates(format!(
                "updates.check_delay_ms must be <= {}, got {}",
                MAX_CHECK_DELAY_MS, self.check_delay_ms
            )));
        }

        Ok(())
    }
}
