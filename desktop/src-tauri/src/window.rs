//! Main window and the content loading adapter over it.

use md_shell::{HostInfo, ShellWindow};
use tauri::window::Color;
use tauri::{AppHandle, Manager, Runtime, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tracing::warn;
use url::Url;

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const WINDOW_TITLE: &str = "MeaDocs - AI-Powered Search";

const WINDOW_SIZE: (f64, f64) = (1400.0, 900.0);
const MIN_WINDOW_SIZE: (f64, f64) = (1000.0, 700.0);
/// Matches the backend UI's slate background so the blank window does not flash
const BACKGROUND: Color = Color(15, 23, 42, 255);

/// Create the main window on the bundled blank page.
///
/// The host bridge and the load confirmation script are injected into every
/// page, including backend content.
pub fn create_main_window<R: Runtime>(
    app: &AppHandle<R>,
    host: &HostInfo,
    confirmation_script: &str,
) -> tauri::Result<WebviewWindow<R>> {
    let window = WebviewWindowBuilder::new(
        app,
        MAIN_WINDOW_LABEL,
        WebviewUrl::App("index.html".into()),
    )
    .title(WINDOW_TITLE)
    .inner_size(WINDOW_SIZE.0, WINDOW_SIZE.1)
    .min_inner_size(MIN_WINDOW_SIZE.0, MIN_WINDOW_SIZE.1)
    .background_color(BACKGROUND)
    .initialization_script(host.bridge_script())
    .initialization_script(confirmation_script)
    .build()?;

    window.maximize().ok();
    Ok(window)
}

/// Bring the existing window forward (second instance launch).
pub fn focus_main_window<R: Runtime>(app: &AppHandle<R>) {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) {
        window.unminimize().ok();
        window.show().ok();
        window.set_focus().ok();
    }
}

/// Whether `page` is served by the backend at `backend`.
pub fn is_backend_page(backend: &Url, page: &Url) -> bool {
    backend.scheme() == page.scheme()
        && backend.host_str() == page.host_str()
        && backend.port_or_known_default() == page.port_or_known_default()
}

pub struct TauriShellWindow<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriShellWindow<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> ShellWindow for TauriShellWindow<R> {
    fn load_url(&self, url: &Url) -> bool {
        let Some(window) = self.app.get_webview_window(MAIN_WINDOW_LABEL) else {
            return false;
        };

        if let Err(e) = window.navigate(url.clone()) {
            warn!("Failed to navigate main window to {url}: {e}");
            return false;
        }
        true
    }
}
