//! IPC commands reachable from backend pages.

use crate::window::is_backend_page;

use md_shell::ContentLoader;
use tauri::{State, Webview};
use tracing::{debug, warn};

/// Called by the confirmation script once a backend document has loaded.
#[tauri::command]
pub fn backend_page_loaded(webview: Webview, loader: State<'_, ContentLoader>) {
    match webview.url() {
        Ok(page) if is_backend_page(loader.url(), &page) => {
            debug!("Backend page loaded: {page}");
            loader.page_confirmed();
        }
        Ok(page) => warn!("Ignoring load confirmation from non-backend page {page}"),
        Err(e) => warn!("Ignoring load confirmation, page URL unavailable: {e}"),
    }
}
