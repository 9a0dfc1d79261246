use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const MIN_INTERVAL_MS: u64 = 50;
pub const MAX_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 500;
pub const DEFAULT_LOAD_RETRY_INTERVAL_MS: u64 = 500;

pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_LOAD_CONFIRM_TIMEOUT_MS: u64 = 3_000;

/// Readiness polling and content reload timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Wait between readiness probes
    pub probe_interval_ms: u64,
    /// Per-request timeout of a single probe
    pub request_timeout_ms: u64,
    /// Wait before reloading content that failed to load
    pub load_retry_interval_ms: u64,
    /// How long a finished page load may take to confirm it came from the backend
    pub load_confirm_timeout_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            load_retry_interval_ms: DEFAULT_LOAD_RETRY_INTERVAL_MS,
            load_confirm_timeout_ms: DEFAULT_LOAD_CONFIRM_TIMEOUT_MS,
        }
    }
}

impl ReadinessConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, value) in [
            ("readiness.probe_interval_ms", self.probe_interval_ms),
            ("readiness.load_retry_interval_ms", self.load_retry_interval_ms),
        ] {
            if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&value) {
                return Err(ConfigError::readiness(format!(
                    "{name} must be {MIN_INTERVAL_MS}-{MAX_INTERVAL_MS}, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("readiness.request_timeout_ms", self.request_timeout_ms),
            ("readiness.load_confirm_timeout_ms", self.load_confirm_timeout_ms),
        ] {
            if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&value) {
                return Err(ConfigError::readiness(format!(
                    "{name} must be {MIN_REQUEST_TIMEOUT_MS}-{MAX_REQUEST_TIMEOUT_MS}, got {value}"
                )));
            }
        }

        Ok(())
    }
}
