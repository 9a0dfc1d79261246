use crate::{
    BackendConfig, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_CONFIG_DIR_NAME, LauncherConfig, LoggingConfig, ReadinessConfig, RunMode,
    SupervisorConfig, UpdateConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Forces the run mode instead of deriving it from the build profile
    pub run_mode: Option<RunMode>,
    pub backend: BackendConfig,
    pub launcher: LauncherConfig,
    pub supervisor: SupervisorConfig,
    pub readiness: ReadinessConfig,
    pub updates: UpdateConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the default config directory.
    ///
    /// Loading order:
    /// 1. MD_CONFIG_DIR env var, else ./.meadocs/
    /// 2. See [`Config::load_from`]
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load config from a specific directory.
    ///
    /// 1. Auto-create the directory if it doesn't exist
    /// 2. Load config.toml if it exists, else use defaults
    /// 3. Apply MD_* environment variable overrides
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: MD_CONFIG_DIR env var > ./.meadocs/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::WorkingDir { source })?;
        Ok(Self::config_dir_or(&cwd.join(DEFAULT_CONFIG_DIR_NAME)))
    }

    /// MD_CONFIG_DIR if set, otherwise `fallback`.
    pub fn config_dir_or(fallback: &Path) -> PathBuf {
        match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => fallback.to_path_buf(),
        }
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.backend.validate()?;
        self.launcher.validate()?;
        self.supervisor.validate()?;
        self.readiness.validate()?;
        self.updates.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Effective run mode: configured value, else derived from the build.
    pub fn run_mode(&self) -> RunMode {
        self.run_mode.unwrap_or_else(RunMode::for_build)
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  run_mode: {}", self.run_mode());
        info!("  backend: {}", self.backend.url());
        info!(
            "  launcher: entry={}, interpreter={}, packaged={}/{}",
            self.launcher.entry_script,
            self.launcher.system_interpreter,
            self.launcher.packaged_dir,
            self.launcher.packaged_executable
        );

        let ceiling = self
            .supervisor
            .max_restarts
            .map_or_else(|| "unbounded".to_string(), |max| max.to_string());
        info!(
            "  supervisor: delay={}ms, backoff={}x, max={}, spawn_failure={:?}",
            self.supervisor.restart_delay_ms,
            self.supervisor.backoff_multiplier,
            ceiling,
            self.supervisor.spawn_failure
        );

        info!(
            "  readiness: probe={}ms, timeout={}ms, reload={}ms, confirm={}ms",
            self.readiness.probe_interval_ms,
            self.readiness.request_timeout_ms,
            self.readiness.load_retry_interval_ms,
            self.readiness.load_confirm_timeout_ms
        );

        info!(
            "  updates: {} (delay {}ms)",
            if self.updates.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.updates.check_delay_ms
        );

        info!(
            "  logging: {} (dir {}, diagnostics {})",
            *self.logging.level, self.logging.directory, self.logging.diagnostic_file
        );
    }

    fn apply_env_overrides(&mut self) {
        Self::apply_env_option_parse("MD_RUN_MODE", &mut self.run_mode);

        // Backend
        Self::apply_env_string("MD_BACKEND_HOST", &mut self.backend.host);
        Self::apply_env_parse("MD_BACKEND_PORT", &mut self.backend.port);

        // Launcher
        Self::apply_env_option_path("MD_PROJECT_DIR", &mut self.launcher.project_dir);
        Self::apply_env_string("MD_VENV_DIR", &mut self.launcher.venv_dir);
        Self::apply_env_string(
            "MD_SYSTEM_INTERPRETER",
            &mut self.launcher.system_interpreter,
        );
        Self::apply_env_string("MD_ENTRY_SCRIPT", &mut self.launcher.entry_script);

        // Supervisor
        Self::apply_env_parse(
            "MD_SUPERVISOR_RESTART_DELAY_MS",
            &mut self.supervisor.restart_delay_ms,
        );
        Self::apply_env_parse(
            "MD_SUPERVISOR_BACKOFF_MULTIPLIER",
            &mut self.supervisor.backoff_multiplier,
        );
        Self::apply_env_parse(
            "MD_SUPERVISOR_MAX_RESTART_DELAY_MS",
            &mut self.supervisor.max_restart_delay_ms,
        );
        Self::apply_env_option_parse(
            "MD_SUPERVISOR_MAX_RESTARTS",
            &mut self.supervisor.max_restarts,
        );
        Self::apply_env_parse(
            "MD_SUPERVISOR_SPAWN_FAILURE",
            &mut self.supervisor.spawn_failure,
        );

        // Readiness
        Self::apply_env_parse(
            "MD_READINESS_PROBE_INTERVAL_MS",
            &mut self.readiness.probe_interval_ms,
        );
        Self::apply_env_parse(
            "MD_READINESS_REQUEST_TIMEOUT_MS",
            &mut self.readiness.request_timeout_ms,
        );
        Self::apply_env_parse(
            "MD_READINESS_LOAD_RETRY_INTERVAL_MS",
            &mut self.readiness.load_retry_interval_ms,
        );
        Self::apply_env_parse(
            "MD_READINESS_LOAD_CONFIRM_TIMEOUT_MS",
            &mut self.readiness.load_confirm_timeout_ms,
        );

        // Updates
        Self::apply_env_bool("MD_UPDATES_ENABLED", &mut self.updates.enabled);
        Self::apply_env_parse("MD_UPDATES_CHECK_DELAY_MS", &mut self.updates.check_delay_ms);

        // Logging
        Self::apply_env_parse("MD_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("MD_LOG_DIR", &mut self.logging.directory);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for optional parseable values
    fn apply_env_option_parse<T: std::str::FromStr>(var_name: &str, target: &mut Option<T>) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = Some(parsed);
        }
    }

    /// Helper: Apply environment variable override for Option<PathBuf> values
    fn apply_env_option_path(var_name: &str, target: &mut Option<PathBuf>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(PathBuf::from(val));
        }
    }
}
