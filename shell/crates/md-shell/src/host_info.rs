//! Values the displayed content may read from the host.

use serde::Serialize;

/// Global name the bridge object is published under.
pub const BRIDGE_GLOBAL: &str = "meadocs";
/// Name existing backend pages already read the same object from.
pub const LEGACY_BRIDGE_GLOBAL: &str = "electronAPI";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    /// Node-style platform identifier (`win32`, `darwin`, `linux`, ...)
    pub platform: String,
    /// Shell version
    pub version: String,
}

impl HostInfo {
    /// Info for the running host.
    pub fn current(version: impl Into<String>) -> Self {
        Self {
            platform: platform_id(std::env::consts::OS).to_string(),
            version: version.into(),
        }
    }

    /// Initialization script publishing one frozen object as read-only
    /// `window.meadocs` and `window.electronAPI`.
    pub fn bridge_script(&self) -> String {
        let value = serde_json::json!({
            "platform": self.platform,
            "version": self.version,
        });
        let names = serde_json::json!([BRIDGE_GLOBAL, LEGACY_BRIDGE_GLOBAL]);

        format!(
            "(function () {{ const info = Object.freeze({value}); \
             for (const name of {names}) {{ Object.defineProperty(window, name, \
             {{ value: info, writable: false, configurable: false, enumerable: true }}); }} }})();"
        )
    }
}

pub fn platform_id(os: &str) -> &str {
    match os {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}
