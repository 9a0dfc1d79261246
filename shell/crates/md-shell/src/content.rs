use crate::LifecycleContext;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use md_config::ReadinessConfig;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

/// Host command a backend document invokes once it has really loaded.
pub const PAGE_LOADED_COMMAND: &str = "backend_page_loaded";

/// The native window showing backend content.
pub trait ShellWindow: Send + Sync + 'static {
    /// Navigate to `url`. Returns false when the window no longer exists.
    fn load_url(&self, url: &Url) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSettings {
    /// Wait before reloading content that failed to load
    pub retry_interval: Duration,
    /// How long a finished navigation may wait for the document's confirmation
    pub confirm_timeout: Duration,
}

impl From<&ReadinessConfig> for LoadSettings {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            retry_interval: Duration::from_millis(config.load_retry_interval_ms),
            confirm_timeout: Duration::from_millis(config.load_confirm_timeout_ms),
        }
    }
}

/// Loads the backend UI into the window and retries failed loads.
///
/// A backend navigation counts as loaded only once the document itself
/// confirms it (see [`ContentLoader::confirmation_script`]). The backend
/// answering a health check says nothing about whether the page load that
/// followed succeeded, so a finished navigation without that confirmation
/// is treated as a failed load.
#[derive(Clone)]
pub struct ContentLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    window: Arc<dyn ShellWindow>,
    url: Url,
    settings: LoadSettings,
    lifecycle: LifecycleContext,
    pending_retry: AtomicBool,
    /// Sequence number of the latest backend navigation
    navigation: AtomicU64,
    /// Latest navigation whose document confirmed the load
    confirmed: watch::Sender<u64>,
}

impl ContentLoader {
    pub fn new(
        window: Arc<dyn ShellWindow>,
        url: Url,
        settings: LoadSettings,
        lifecycle: LifecycleContext,
    ) -> Self {
        let (confirmed, _) = watch::channel(0);

        Self {
            inner: Arc::new(LoaderInner {
                window,
                url,
                settings,
                lifecycle,
                pending_retry: AtomicBool::new(false),
                navigation: AtomicU64::new(0),
                confirmed,
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Ask the window to load the backend URL. No-op if the window is gone.
    pub fn load(&self) -> bool {
        if self.inner.window.load_url(&self.inner.url) {
            info!("Loading {}", self.inner.url);
            true
        } else {
            debug!("Window gone, skipping load of {}", self.inner.url);
            false
        }
    }

    /// A navigation to the backend origin began. Returns its sequence number.
    pub fn page_started(&self) -> u64 {
        let navigation = self.inner.navigation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Backend navigation {navigation} started");
        navigation
    }

    /// The current document reported that it is the backend's page.
    pub fn page_confirmed(&self) {
        let navigation = self.inner.navigation.load(Ordering::SeqCst);
        self.inner.confirmed.send_if_modified(|confirmed| {
            if *confirmed < navigation {
                *confirmed = navigation;
                true
            } else {
                false
            }
        });
        debug!("Backend navigation {navigation} confirmed by its document");
    }

    /// Whether the latest backend navigation has been confirmed.
    pub fn is_confirmed(&self) -> bool {
        *self.inner.confirmed.borrow() >= self.inner.navigation.load(Ordering::SeqCst)
    }

    /// A navigation in the window finished, successfully or with an error page.
    ///
    /// Waits up to the confirm timeout for the document of the latest backend
    /// navigation to confirm itself, and reports a failed load otherwise.
    /// Returns true when the load was already confirmed.
    pub fn page_finished(&self) -> bool {
        let navigation = self.inner.navigation.load(Ordering::SeqCst);
        if self.is_confirmed() {
            return true;
        }

        let loader = self.clone();
        let mut confirmed = self.inner.confirmed.subscribe();
        tokio::spawn(async move {
            let wait = async {
                loop {
                    let current = *confirmed.borrow_and_update();
                    if current >= navigation {
                        return true;
                    }
                    if confirmed.changed().await.is_err() {
                        return false;
                    }
                }
            };

            let arrived = tokio::time::timeout(loader.inner.settings.confirm_timeout, wait)
                .await
                .unwrap_or(false);

            // A newer navigation gets its own check
            if arrived || loader.inner.navigation.load(Ordering::SeqCst) != navigation {
                return;
            }
            loader.on_load_failed("page did not confirm it was served by the backend");
        });

        false
    }

    /// Schedule a reload after the retry interval.
    ///
    /// Returns false when a retry is already pending or shutdown has begun.
    pub fn on_load_failed(&self, reason: &str) -> bool {
        if self.inner.lifecycle.is_shutdown_requested() {
            return false;
        }

        if self.inner.pending_retry.swap(true, Ordering::SeqCst) {
            debug!("Reload already pending, ignoring failure: {reason}");
            return false;
        }

        warn!(
            "Failed to load {} ({reason}), retrying in {}ms",
            self.inner.url,
            self.inner.settings.retry_interval.as_millis()
        );

        let loader = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(loader.inner.settings.retry_interval).await;
            loader.inner.pending_retry.store(false, Ordering::SeqCst);

            if loader.inner.lifecycle.is_shutdown_requested() {
                return;
            }
            loader.load();
        });

        true
    }

    /// Initialization script that confirms a load from inside the document.
    ///
    /// Only a document on the backend origin that actually received an HTTP
    /// response invokes [`PAGE_LOADED_COMMAND`]. Webview error pages either
    /// live on another origin or have no response, so they stay silent.
    pub fn confirmation_script(&self) -> String {
        let origin = serde_json::Value::from(self.inner.url.origin().ascii_serialization());
        let command = serde_json::Value::from(PAGE_LOADED_COMMAND);

        format!(
            r#"(function () {{
  if (window.location.origin !== {origin}) return;
  var entry = performance.getEntriesByType("navigation")[0];
  if (!entry || !(entry.responseStart > 0)) return;
  var confirm = function () {{
    var ipc = window.__TAURI_INTERNALS__;
    if (ipc) ipc.invoke({command}).catch(function () {{}});
  }};
  if (document.readyState === "loading") {{
    document.addEventListener("DOMContentLoaded", confirm, {{ once: true }});
  }} else {{
    confirm();
  }}
}})();"#
        )
    }
}
