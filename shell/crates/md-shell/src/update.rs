//! Self-update policy. The channel and the prompts are platform adapters.

use crate::{DiagnosticLog, ShellResult};

use std::time::Duration;

use async_trait::async_trait;
use md_config::{RunMode, UpdateConfig};
use tracing::{debug, error, info};

/// An update offered by the channel.
#[derive(Debug)]
pub struct AvailableUpdate<P> {
    pub version: String,
    pub handle: P,
}

#[async_trait]
pub trait UpdateChannel: Send + Sync {
    type Pending: Send;
    type Downloaded: Send;

    async fn check(&self) -> ShellResult<Option<AvailableUpdate<Self::Pending>>>;

    async fn download(&self, pending: Self::Pending) -> ShellResult<Self::Downloaded>;

    /// Install and restart into the new version.
    async fn install(&self, downloaded: Self::Downloaded) -> ShellResult<()>;
}

/// User consent for each update step.
#[async_trait]
pub trait UpdatePrompt: Send + Sync {
    async fn confirm_download(&self, version: &str) -> bool;

    async fn confirm_install(&self, version: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSettings {
    pub enabled: bool,
    /// Delay between startup and the first check
    pub check_delay: Duration,
}

impl From<&UpdateConfig> for UpdateSettings {
    fn from(config: &UpdateConfig) -> Self {
        Self {
            enabled: config.enabled,
            check_delay: Duration::from_millis(config.check_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Development build or updates disabled
    Skipped,
    UpToDate,
    DownloadDeclined,
    InstallDeclined,
    Installed,
    Failed(String),
}

pub struct UpdateCoordinator<C, P> {
    channel: C,
    prompt: P,
    mode: RunMode,
    settings: UpdateSettings,
    log: DiagnosticLog,
}

impl<C, P> UpdateCoordinator<C, P>
where
    C: UpdateChannel,
    P: UpdatePrompt,
{
    pub fn new(
        channel: C,
        prompt: P,
        mode: RunMode,
        settings: UpdateSettings,
        log: DiagnosticLog,
    ) -> Self {
        Self {
            channel,
            prompt,
            mode,
            settings,
            log,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Wait out the startup delay, then check, prompt, download and install.
    ///
    /// Errors go to the diagnostic log and never reach the user.
    pub async fn run(&self) -> UpdateOutcome {
        if !self.mode.is_packaged() {
            debug!("Update check skipped in {} mode", self.mode);
            return UpdateOutcome::Skipped;
        }

        if !self.settings.enabled {
            debug!("Update check disabled by configuration");
            return UpdateOutcome::Skipped;
        }

        tokio::time::sleep(self.settings.check_delay).await;

        match self.check_and_apply().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Auto-update error: {e}");
                self.log.append(&format!("Auto-update error: {e}"));
                UpdateOutcome::Failed(e.to_string())
            }
        }
    }

    async fn check_and_apply(&self) -> ShellResult<UpdateOutcome> {
        let Some(update) = self.channel.check().await? else {
            info!("No update available");
            return Ok(UpdateOutcome::UpToDate);
        };

        let version = update.version;
        info!("Update available: {version}");

        if !self.prompt.confirm_download(&version).await {
            info!("Download of {version} declined");
            return Ok(UpdateOutcome::DownloadDeclined);
        }

        let downloaded = self.channel.download(update.handle).await?;
        info!("Update {version} downloaded");

        if !self.prompt.confirm_install(&version).await {
            info!("Install of {version} deferred");
            return Ok(UpdateOutcome::InstallDeclined);
        }

        self.channel.install(downloaded).await?;
        Ok(UpdateOutcome::Installed)
    }
}
