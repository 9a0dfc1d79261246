use crate::{ConfigError, ConfigErrorResult, DEFAULT_HOST, DEFAULT_PORT, LOCALHOST, MIN_PORT};

use serde::Deserialize;

/// Where the supervised backend listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Loopback host the backend binds to
    pub host: String,
    /// Fixed port the backend serves on
    pub port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
        }
    }
}

impl BackendConfig {
    /// Root URL of the backend web UI.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port < MIN_PORT {
            return Err(ConfigError::backend(format!(
                "backend.port must be >= {} (unprivileged), got {}",
                MIN_PORT, self.port
            )));
        }

        if self.host != DEFAULT_HOST && self.host != LOCALHOST {
            return Err(ConfigError::backend(format!(
                "backend.host must be {DEFAULT_HOST} or {LOCALHOST}, got {}",
                self.host
            )));
        }

        Ok(())
    }
}
