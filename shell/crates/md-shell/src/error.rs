use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Failed to spawn backend {program}: {source} {location}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to signal process tree {pid}: {message} {location}")]
    Signal {
        pid: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("Shutdown in progress, backend will not be started {location}")]
    ShuttingDown { location: ErrorLocation },

    #[error("Invalid backend URL {url}: {source} {location}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
        location: ErrorLocation,
    },

    #[error("Update failed: {message} {location}")]
    Update {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("HTTP error: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },
}

impl ShellError {
    #[track_caller]
    pub fn spawn_failed(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn signal(pid: u32, message: impl Into<String>) -> Self {
        Self::Signal {
            pid,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn shutting_down() -> Self {
        Self::ShuttingDown {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn update(message: impl Into<String>) -> Self {
        Self::Update {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether this error is recoverable via retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Update { .. } | Self::Signal { .. }
        )
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::SpawnFailed { .. } => {
                "The backend could not be started. \
                   Check that the Python environment or the bundled server is installed."
            }
            Self::Signal { .. } => {
                "The backend did not respond to the stop request. \
                   It may need to be ended from the task manager."
            }
            Self::ShuttingDown { .. } => "The application is closing.",
            Self::InvalidUrl { .. } => {
                "The backend address is invalid. \
                   Check the [backend] section of config.toml."
            }
            Self::Update { .. } => {
                "The update could not be applied. \
                   It will be offered again on the next launch."
            }
            _ => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<std::io::Error> for ShellError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for ShellError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
