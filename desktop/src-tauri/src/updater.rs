//! Update channel and consent dialogs backed by the Tauri updater and dialog plugins.

use async_trait::async_trait;
use md_shell::{AvailableUpdate, ShellError, ShellResult, UpdateChannel, UpdatePrompt};
use tauri::{AppHandle, Runtime};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tauri_plugin_updater::{Update, UpdaterExt};
use tokio::sync::oneshot;
use tracing::info;

pub struct TauriUpdateChannel<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriUpdateChannel<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

#[async_trait]
impl<R: Runtime> UpdateChannel for TauriUpdateChannel<R> {
    type Pending = Update;
    type Downloaded = (Update, Vec<u8>);

    async fn check(&self) -> ShellResult<Option<AvailableUpdate<Update>>> {
        let updater = self
            .app
            .updater()
            .map_err(|e| ShellError::update(format!("updater unavailable: {e}")))?;

        let update = updater
            .check()
            .await
            .map_err(|e| ShellError::update(format!("check failed: {e}")))?;

        Ok(update.map(|update| AvailableUpdate {
            version: update.version.clone(),
            handle: update,
        }))
    }

    async fn download(&self, pending: Update) -> ShellResult<(Update, Vec<u8>)> {
        let bytes = pending
            .download(|_, _| {}, || {})
            .await
            .map_err(|e| ShellError::update(format!("download failed: {e}")))?;

        Ok((pending, bytes))
    }

    async fn install(&self, downloaded: (Update, Vec<u8>)) -> ShellResult<()> {
        let (update, bytes) = downloaded;
        update
            .install(&bytes)
            .map_err(|e| ShellError::update(format!("install failed: {e}")))?;

        info!("Update {} installed, restarting", update.version);
        self.app.request_restart();
        Ok(())
    }
}

pub struct DialogPrompt<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> DialogPrompt<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }

    async fn ask(&self, title: &str, message: String, buttons: MessageDialogButtons) -> bool {
        let (tx, rx) = oneshot::channel();

        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Info)
            .buttons(buttons)
            .show(move |answer| {
                let _ = tx.send(answer);
            });

        // A dismissed dialog counts as a refusal
        rx.await.unwrap_or(false)
    }
}

#[async_trait]
impl<R: Runtime> UpdatePrompt for DialogPrompt<R> {
    async fn confirm_download(&self, version: &str) -> bool {
        self.ask(
            "Update Available",
            download_message(version),
            MessageDialogButtons::YesNo,
        )
        .await
    }

    async fn confirm_install(&self, version: &str) -> bool {
        self.ask(
            "Update Ready",
            install_message(version),
            MessageDialogButtons::OkCancelCustom(String::from("Restart"), String::from("Later")),
        )
        .await
    }
}

pub fn download_message(version: &str) -> String {
    format!("A new version of MeaDocs ({version}) is available. Do you want to download it now?")
}

pub fn install_message(version: &str) -> String {
    format!(
        "MeaDocs {version} has been downloaded. The application will restart to install the update."
    )
}
