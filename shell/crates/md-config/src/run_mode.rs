use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Whether the shell runs from a source checkout or from an installed bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Development,
    Packaged,
}

impl RunMode {
    /// Mode implied by the build profile: debug builds run from source.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            RunMode::Development
        } else {
            RunMode::Packaged
        }
    }

    pub fn is_packaged(&self) -> bool {
        matches!(self, RunMode::Packaged)
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(RunMode::Development),
            "packaged" | "production" | "prod" => Ok(RunMode::Packaged),
            other => Err(format!("unknown run mode '{other}'")),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Development => f.write_str("development"),
            RunMode::Packaged => f.write_str("packaged"),
        }
    }
}
