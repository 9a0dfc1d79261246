use std::time::Duration;

use md_config::{SpawnFailurePolicy, SupervisorConfig};

/// When and how often a crashed backend is restarted.
///
/// Defaults restart after a fixed two second delay, forever.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartPolicy {
    pub delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    /// `None` restarts without limit
    pub max_restarts: Option<u32>,
    /// A process that lived this long resets the consecutive restart count
    pub stable_after: Duration,
}

impl RestartPolicy {
    /// Delay before restart number `attempt` (1-based), or `None` past the ceiling.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_restarts
            && attempt > max
        {
            return None;
        }

        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64()).max(self.delay.as_secs_f64());

        Some(Duration::from_secs_f64(capped))
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        RestartPolicy::from(&SupervisorConfig::default())
    }
}

impl From<&SupervisorConfig> for RestartPolicy {
    fn from(config: &SupervisorConfig) -> Self {
        let delay = Duration::from_millis(config.restart_delay_ms);
        Self {
            delay,
            backoff_multiplier: config.backoff_multiplier,
            max_delay: Duration::from_millis(config.max_restart_delay_ms).max(delay),
            max_restarts: config.max_restarts,
            stable_after: Duration::from_secs(config.stable_after_secs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupervisorPolicy {
    pub restart: RestartPolicy,
    pub spawn_failure: SpawnFailurePolicy,
}

impl From<&SupervisorConfig> for SupervisorPolicy {
    fn from(config: &SupervisorConfig) -> Self {
        Self {
            restart: RestartPolicy::from(config),
            spawn_failure: config.spawn_failure,
        }
    }
}
