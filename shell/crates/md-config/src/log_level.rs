use crate::DEFAULT_LOG_LEVEL;

use std::convert::Infallible;
use std::ops::Deref;
use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Deserializer};

/// Configured verbosity for the shell's own crates.
///
/// Parsing never fails: unknown names and non-string TOML values become
/// `info`, so a typo in `config.toml` cannot keep the app from starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub LevelFilter);

impl LogLevel {
    /// Lowercase directive usable in a tracing `EnvFilter`.
    pub fn as_directive(&self) -> String {
        self.0.as_str().to_lowercase()
    }

    fn parse_lenient(raw: &str) -> Self {
        let raw = raw.trim();
        // Python's logging spells it out
        if raw.eq_ignore_ascii_case("warning") {
            return LogLevel(LevelFilter::Warn);
        }
        LogLevel(LevelFilter::from_str(raw).unwrap_or(DEFAULT_LOG_LEVEL))
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(DEFAULT_LOG_LEVEL)
    }
}

impl FromStr for LogLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(String::deserialize(deserializer)
            .map(|raw| Self::parse_lenient(&raw))
            .unwrap_or_default())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

impl Deref for LogLevel {
    type Target = LevelFilter;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
