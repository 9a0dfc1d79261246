//! Append-only diagnostic log for backend output and shell events.
//!
//! Separate from the tracing files: one line per event, no rotation,
//! formatted as `<ISO8601 UTC millis> - <message>`.

use std::fs::OpenOptions;
use std::io::Write;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: Option<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl DiagnosticLog {
    /// Log appending to `path`. Parent directories are created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Log that drops every entry.
    pub fn disabled() -> Self {
        Self {
            path: None,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one timestamped entry. Write failures are traced, never raised.
    pub fn append(&self, message: &str) {
        let Some(path) = &self.path else {
            return;
        };

        let entry = Self::format_entry(Utc::now(), message);
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Err(e) = Self::write_entry(path, &entry) {
            warn!("Failed to write diagnostic log {}: {e}", path.display());
        }
    }

    pub fn format_entry(timestamp: DateTime<Utc>, message: &str) -> String {
        format!(
            "{} - {}\n",
            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            message
        )
    }

    fn write_entry(path: &Path, entry: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(entry.as_bytes())
    }
}

/// Record panics in the diagnostic log, then defer to the previously
/// installed hook. Panics stay confined to the task or thread that raised them.
pub fn install_panic_hook(log: DiagnosticLog) {
    let previous = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        let message = panic_message(info);
        error!("Uncaught panic: {message}");
        log.append(&format!("Uncaught Exception: {message}"));
        previous(info);
    }));
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown panic payload"));

    match info.location() {
        Some(location) => format!("{payload} at {location}"),
        None => payload,
    }
}
