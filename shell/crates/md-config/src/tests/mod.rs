mod readiness;

use std::env;
use std::ffi::OsString;

use tempfile::TempDir;

const ENV_PREFIX: &str = "MD_";

/// Sets or clears environment variables, restoring every touched key on drop.
///
/// Callers must be `#[serial]`: the process environment is shared.
pub(crate) struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
}

impl EnvGuard {
    pub(crate) fn set(key: &str, value: &str) -> Self {
        let saved = vec![(key.to_string(), env::var_os(key))];
        unsafe { env::set_var(key, value) };
        Self { saved }
    }

    pub(crate) fn remove(key: &str) -> Self {
        Self::remove_all([key.to_string()])
    }

    /// Clear every `MD_*` variable inherited from the test runner.
    pub(crate) fn scrub_overrides() -> Self {
        let keys: Vec<String> = env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .filter(|key| key.starts_with(ENV_PREFIX))
            .collect();
        Self::remove_all(keys)
    }

    fn into_saved(mut self) -> Vec<(String, Option<OsString>)> {
        std::mem::take(&mut self.saved)
    }

    fn remove_all(keys: impl IntoIterator<Item = String>) -> Self {
        let saved = keys
            .into_iter()
            .map(|key| {
                let original = env::var_os(&key);
                unsafe { env::remove_var(&key) };
                (key, original)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // Reverse order so a key touched twice ends at its first saved value
        for (key, original) in self.saved.drain(..).rev() {
            unsafe {
                match original {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}

/// Point MD_CONFIG_DIR at a fresh temp dir with no other overrides in effect.
pub(crate) fn setup_config_dir() -> (TempDir, EnvGuard) {
    let temp = TempDir::new().unwrap();
    let mut guard = EnvGuard::scrub_overrides();
    let dir = EnvGuard::set("MD_CONFIG_DIR", temp.path().to_str().unwrap());
    guard.saved.extend(dir.into_saved());
    (temp, guard)
}
