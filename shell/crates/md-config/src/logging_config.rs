use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_DIAGNOSTIC_FILE, DEFAULT_LOG_DIRECTORY, LogLevel,
};

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Directory for host logs, relative to the app data directory
    pub directory: String,
    /// Append-only diagnostic file inside `directory`
    pub diagnostic_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            directory: String::from(DEFAULT_LOG_DIRECTORY),
            diagnostic_file: String::from(DEFAULT_DIAGNOSTIC_FILE),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, value) in [
            ("logging.directory", &self.directory),
            ("logging.diagnostic_file", &self.diagnostic_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::logging(format!("{name} must not be empty")));
            }

            if Path::new(value).is_absolute() || value.contains("..") {
                return Err(ConfigError::logging(format!(
                    "{name} must be relative and cannot contain '..', got {value}"
                )));
            }
        }

        Ok(())
    }
}
