use crate::{ConfigError, ConfigErrorResult};

use std::str::FromStr;

use serde::Deserialize;

pub const MIN_RESTART_DELAY_MS: u64 = 100;
pub const MAX_RESTART_DELAY_MS: u64 = 60_000;
pub const DEFAULT_RESTART_DELAY_MS: u64 = 2_000;

pub const MIN_BACKOFF_MULTIPLIER: f64 = 1.0;
pub const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.0;

pub const DEFAULT_MAX_RESTART_DELAY_MS: u64 = 30_000;
pub const DEFAULT_STABLE_AFTER_SECS: u64 = 60;

/// What the supervisor does when the backend cannot be spawned at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnFailurePolicy {
    /// Report the error and stay down (misconfiguration is not retried)
    #[default]
    FailFast,
    /// Treat a failed spawn like a crash and schedule a restart
    Retry,
}

impl FromStr for SpawnFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(SpawnFailurePolicy::FailFast),
            "retry" => Ok(SpawnFailurePolicy::Retry),
            other => Err(format!("unknown spawn failure policy '{other}'")),
        }
    }
}

/// Crash-restart behaviour of the backend supervisor.
///
/// The defaults restart forever after a fixed delay. A ceiling and
/// backoff growth are available but disabled unless configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay before the first restart after an unexpected exit
    pub restart_delay_ms: u64,
    /// Growth factor applied per consecutive restart (1.0 = fixed delay)
    pub backoff_multiplier: f64,
    /// Upper bound on the grown delay
    pub max_restart_delay_ms: u64,
    /// Consecutive restarts allowed before giving up (unset = unbounded)
    pub max_restarts: Option<u32>,
    /// A process that stays up this long resets the consecutive-restart count
    pub stable_after_secs: u64,
    pub spawn_failure: SpawnFailurePolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay_ms: DEFAULT_RESTART_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_restart_delay_ms: DEFAULT_MAX_RESTART_DELAY_MS,
            max_restarts: None,
            stable_after_secs: DEFAULT_STABLE_AFTER_SECS,
            spawn_failure: SpawnFailurePolicy::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.restart_delay_ms < MIN_RESTART_DELAY_MS
            || self.restart_delay_ms > MAX_RESTART_DELAY_MS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.restart_delay_ms must be {}-{}, got {}",
                MIN_RESTART_DELAY_MS, MAX_RESTART_DELAY_MS, self.restart_delay_ms
            )));
        }

        if self.backoff_multiplier < MIN_BACKOFF_MULTIPLIER
            || self.backoff_multiplier > MAX_BACKOFF_MULTIPLIER
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.backoff_multiplier must be {}-{}, got {}",
                MIN_BACKOFF_MULTIPLIER, MAX_BACKOFF_MULTIPLIER, self.backoff_multiplier
            )));
        }

        if self.max_restart_delay_ms < self.restart_delay_ms {
            return Err(ConfigError::supervisor(format!(
                "supervisor.max_restart_delay_ms ({}) must be >= restart_delay_ms ({})",
                self.max_restart_delay_ms, self.restart_delay_ms
            )));
        }

        Ok(())
    }
}
