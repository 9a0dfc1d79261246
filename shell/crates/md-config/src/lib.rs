mod backend_config;
mod config;
mod error;
mod launcher_config;
mod log_level;
mod logging_config;
mod readiness_config;
mod run_mode;
mod supervisor_config;
mod update_config;

pub use backend_config::BackendConfig;
pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult, ConfigSection};
pub use launcher_config::LauncherConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use readiness_config::ReadinessConfig;
pub use run_mode::RunMode;
pub use supervisor_config::{SpawnFailurePolicy, SupervisorConfig};
pub use update_config::UpdateConfig;

#[cfg(test)]
mod tests;

/// Environment variable naming the directory that holds `config.toml`.
pub const CONFIG_DIR_ENV: &str = "MD_CONFIG_DIR";
pub const CONFIG_FILENAME: &str = "config.toml";
const DEFAULT_CONFIG_DIR_NAME: &str = ".meadocs";

const DEFAULT_HOST: &str = "127.0.0.1";
const LOCALHOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5000;
const MIN_PORT: u16 = 1024;

const DEFAULT_VENV_DIR: &str = ".venv";
const DEFAULT_SYSTEM_INTERPRETER: &str = "python";
const DEFAULT_ENTRY_SCRIPT: &str = "app.py";
const DEFAULT_PACKAGED_DIR: &str = "meadoc_server";
const DEFAULT_PACKAGED_EXECUTABLE: &str = "meadoc_server";

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "logs";
const DEFAULT_DIAGNOSTIC_FILE: &str = "debug.log";
