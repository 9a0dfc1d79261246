//! Resolution of the backend command for the current run mode.

use std::collections::BTreeMap;
use std::env::consts::EXE_SUFFIX;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use md_config::{LauncherConfig, RunMode};
use tracing::debug;

/// Disables output buffering in the Python backend so log lines arrive promptly.
pub const ENV_UNBUFFERED: &str = "PYTHONUNBUFFERED";
/// Names the application module for the Flask entry point.
pub const ENV_ENTRY_POINT: &str = "FLASK_APP";

/// Everything needed to spawn one backend instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Backend-specific variables layered over the inherited environment
    pub env: BTreeMap<String, String>,
}

/// Filesystem anchors the launcher resolves against.
#[derive(Debug, Clone)]
pub struct LaunchPaths {
    /// Source checkout containing the entry script (development)
    pub project_dir: PathBuf,
    /// Bundle resources directory (packaged)
    pub resources_dir: PathBuf,
}

/// Produces a fresh [`LaunchCommand`] for every spawn.
pub trait CommandSource: Send + Sync + 'static {
    fn resolve(&self) -> LaunchCommand;
}

impl<F> CommandSource for F
where
    F: Fn() -> LaunchCommand + Send + Sync + 'static,
{
    fn resolve(&self) -> LaunchCommand {
        self()
    }
}

pub struct BackendLauncher {
    mode: RunMode,
    paths: LaunchPaths,
    config: LauncherConfig,
}

impl BackendLauncher {
    pub fn new(mode: RunMode, paths: LaunchPaths, config: LauncherConfig) -> Self {
        Self {
            mode,
            paths,
            config,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    fn resolve_development(&self) -> LaunchCommand {
        let project_dir = &self.paths.project_dir;
        let venv_python = venv_interpreter(&project_dir.join(&self.config.venv_dir));

        let program = if venv_python.is_file() {
            debug!("Using project interpreter {}", venv_python.display());
            venv_python
        } else {
            debug!(
                "No interpreter at {}, falling back to {}",
                venv_python.display(),
                self.config.system_interpreter
            );
            PathBuf::from(&self.config.system_interpreter)
        };

        LaunchCommand {
            program,
            args: vec![self.config.entry_script.clone()],
            working_dir: project_dir.clone(),
            env: self.backend_env(),
        }
    }

    fn resolve_packaged(&self) -> LaunchCommand {
        let server_dir = self.paths.resources_dir.join(&self.config.packaged_dir);
        let program = server_dir.join(format!("{}{}", self.config.packaged_executable, EXE_SUFFIX));

        LaunchCommand {
            program,
            args: Vec::new(),
            working_dir: server_dir,
            env: self.backend_env(),
        }
    }

    fn backend_env(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (ENV_UNBUFFERED.to_string(), "1".to_string()),
            (ENV_ENTRY_POINT.to_string(), self.config.entry_script.clone()),
        ])
    }
}

impl CommandSource for BackendLauncher {
    /// Never fails: a missing project interpreter falls back to the system one,
    /// and a missing packaged executable surfaces later as a spawn failure.
    fn resolve(&self) -> LaunchCommand {
        match self.mode {
            RunMode::Development => self.resolve_development(),
            RunMode::Packaged => self.resolve_packaged(),
        }
    }
}

#[cfg(windows)]
fn venv_interpreter(venv: &Path) -> PathBuf {
    venv.join("Scripts").join("python.exe")
}

#[cfg(not(windows))]
fn venv_interpreter(venv: &Path) -> PathBuf {
    venv.join("bin").join("python")
}

/// The environment a spawned backend sees: every inherited variable, raw
/// bytes included, plus `overrides`, which win on key collision.
pub fn effective_environment<I>(
    inherited: I,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: BTreeMap<OsString, OsString> = inherited.into_iter().collect();
    env.extend(
        overrides
            .iter()
            .map(|(key, value)| (OsString::from(key), OsString::from(value))),
    );
    env
}
