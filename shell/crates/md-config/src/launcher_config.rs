use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_ENTRY_SCRIPT, DEFAULT_PACKAGED_DIR,
    DEFAULT_PACKAGED_EXECUTABLE, DEFAULT_SYSTEM_INTERPRETER, DEFAULT_VENV_DIR,
};

use std::path::PathBuf;

use serde::Deserialize;

/// Names used to locate the backend in each run mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Project checkout used in development mode (defaults to the working directory)
    pub project_dir: Option<PathBuf>,
    /// Project-local virtualenv, relative to `project_dir`
    pub venv_dir: String,
    /// Interpreter used when no project-local one exists
    pub system_interpreter: String,
    /// Script passed to the interpreter in development mode
    pub entry_script: String,
    /// Bundled backend directory, relative to the resource directory
    pub packaged_dir: String,
    /// Bundled executable name, without platform suffix
    pub packaged_executable: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            project_dir: None,
            venv_dir: String::from(DEFAULT_VENV_DIR),
            system_interpreter: String::from(DEFAULT_SYSTEM_INTERPRETER),
            entry_script: String::from(DEFAULT_ENTRY_SCRIPT),
            packaged_dir: String::from(DEFAULT_PACKAGED_DIR),
            packaged_executable: String::from(DEFAULT_PACKAGED_EXECUTABLE),
        }
    }
}

impl LauncherConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, value) in [
            ("launcher.venv_dir", &self.venv_dir),
            ("launcher.system_interpreter", &self.system_interpreter),
            ("launcher.entry_script", &self.entry_script),
            ("launcher.packaged_dir", &self.packaged_dir),
            ("launcher.packaged_executable", &self.packaged_executable),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::launcher(format!("{name} must not be empty")));
            }
        }

        if self.packaged_dir.contains("..") || self.packaged_executable.contains("..") {
            return Err(ConfigError::launcher(
                "launcher.packaged_dir and launcher.packaged_executable cannot contain '..'",
            ));
        }

        Ok(())
    }
}
