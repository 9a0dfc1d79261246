use std::fmt;
use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

/// Top-level `config.toml` table a validation error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Backend,
    Launcher,
    Supervisor,
    Readiness,
    Updates,
    Logging,
}

impl fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigSection::Backend => "backend",
            ConfigSection::Launcher => "launcher",
            ConfigSection::Supervisor => "supervisor",
            ConfigSection::Readiness => "readiness",
            ConfigSection::Updates => "updates",
            ConfigSection::Logging => "logging",
        };
        f.write_str(name)
    }
}

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("Invalid [{section}] setting: {message} {location}")]
    Invalid {
        section: ConfigSection,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot determine current working directory: {source}")]
    WorkingDir {
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn invalid<S: Into<String>>(section: ConfigSection, message: S) -> Self {
        ConfigError::Invalid {
            section,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::invalid(ConfigSection::Backend, message)
    }

    #[track_caller]
    pub fn launcher<S: Into<String>>(message: S) -> Self {
        Self::invalid(ConfigSection::Launcher, message)
    }

    #[track_caller]
    pub fn supervisor<S: Into<String>>(message: S) -> Self {
        Self::invalid(ConfigSection::Supervisor, message)
    }

    #[track_caller]
    pub fn readiness<S: Into<String>>(message: S) -> Self {
        Self::invalid(ConfigSection::Readiness, message)
    }

    #[track_caller]
    pub fn updates<S: Into<String>>(message: S) -> Self {
        Self::invalid(ConfigSection::Updates, message)
    }

    #[track_caller]
    pub fn logging<S: Into<String>>(message: S) -> Self {
        Self::invalid(ConfigSection::Logging, message)
    }

    /// Section at fault, for validation errors.
    pub fn section(&self) -> Option<ConfigSection> {
        match self {
            ConfigError::Invalid { section, .. } => Some(*section),
            _ => None,
        }
    }
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
