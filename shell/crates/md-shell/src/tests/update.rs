use crate::{
    AvailableUpdate, DiagnosticLog, ShellError, ShellResult, UpdateChannel, UpdateCoordinator,
    UpdateOutcome, UpdatePrompt, UpdateSettings,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use md_config::RunMode;
use tempfile::TempDir;
use tokio::time::Instant;

#[derive(Default)]
struct FakeChannel {
    available: Option<&'static str>,
    fail_check: bool,
    checks: AtomicUsize,
    downloads: AtomicUsize,
    installs: AtomicUsize,
}

#[async_trait]
impl UpdateChannel for FakeChannel {
    type Pending = String;
    type Downloaded = Vec<u8>;

    async fn check(&self) -> ShellResult<Option<AvailableUpdate<String>>> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_check {
            return Err(ShellError::update("feed unreachable"));
        }
        Ok(self.available.map(|version| AvailableUpdate {
            version: version.to_string(),
            handle: format!("https://updates.example/{version}"),
        }))
    }

    async fn download(&self, _pending: String) -> ShellResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0xde, 0xad])
    }

    async fn install(&self, downloaded: Vec<u8>) -> ShellResult<()> {
        assert_eq!(downloaded, vec![0xde, 0xad]);
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakePrompt {
    download: bool,
    install: bool,
}

#[async_trait]
impl UpdatePrompt for FakePrompt {
    async fn confirm_download(&self, version: &str) -> bool {
        assert_eq!(version, "1.4.0");
        self.download
    }

    async fn confirm_install(&self, _version: &str) -> bool {
        self.install
    }
}

fn settings() -> UpdateSettings {
    UpdateSettings {
        enabled: true,
        check_delay: Duration::from_secs(3),
    }
}

fn coordinator(
    channel: FakeChannel,
    prompt: FakePrompt,
    mode: RunMode,
) -> UpdateCoordinator<FakeChannel, FakePrompt> {
    UpdateCoordinator::new(channel, prompt, mode, settings(), DiagnosticLog::disabled())
}

fn accept_all() -> FakePrompt {
    FakePrompt {
        download: true,
        install: true,
    }
}

#[tokio::test(start_paused = true)]
async fn given_development_mode_when_run_then_skipped_without_check() {
    let channel = FakeChannel {
        available: Some("1.4.0"),
        ..FakeChannel::default()
    };
    let coordinator = coordinator(channel, accept_all(), RunMode::Development);

    let outcome = coordinator.run().await;

    assert_eq!(outcome, UpdateOutcome::Skipped);
    assert_eq!(coordinator.channel_checks(), 0);
}

#[tokio::test(start_paused = true)]
async fn given_updates_disabled_when_run_then_skipped() {
    let coordinator = UpdateCoordinator::new(
        FakeChannel::default(),
        accept_all(),
        RunMode::Packaged,
        UpdateSettings {
            enabled: false,
            ..settings()
        },
        DiagnosticLog::disabled(),
    );

    assert_eq!(coordinator.run().await, UpdateOutcome::Skipped);
}

#[tokio::test(start_paused = true)]
async fn given_packaged_mode_when_run_then_check_deferred_three_seconds() {
    // Given
    let coordinator = coordinator(FakeChannel::default(), accept_all(), RunMode::Packaged);
    let started = Instant::now();

    // When
    let outcome = coordinator.run().await;

    // Then
    assert_eq!(outcome, UpdateOutcome::UpToDate);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(coordinator.channel_checks(), 1);
}

#[tokio::test(start_paused = true)]
async fn given_update_available_when_download_declined_then_nothing_downloaded() {
    let channel = FakeChannel {
        available: Some("1.4.0"),
        ..FakeChannel::default()
    };
    let prompt = FakePrompt {
        download: false,
        install: true,
    };
    let coordinator = coordinator(channel, prompt, RunMode::Packaged);

    assert_eq!(coordinator.run().await, UpdateOutcome::DownloadDeclined);
    assert_eq!(coordinator.channel().downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn given_downloaded_update_when_install_declined_then_not_installed() {
    let channel = FakeChannel {
        available: Some("1.4.0"),
        ..FakeChannel::default()
    };
    let prompt = FakePrompt {
        download: true,
        install: false,
    };
    let coordinator = coordinator(channel, prompt, RunMode::Packaged);

    assert_eq!(coordinator.run().await, UpdateOutcome::InstallDeclined);
    assert_eq!(coordinator.channel().downloads.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.channel().installs.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn given_consent_for_both_steps_when_run_then_installed() {
    let channel = FakeChannel {
        available: Some("1.4.0"),
        ..FakeChannel::default()
    };
    let coordinator = coordinator(channel, accept_all(), RunMode::Packaged);

    assert_eq!(coordinator.run().await, UpdateOutcome::Installed);
    assert_eq!(coordinator.channel().installs.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn given_check_error_when_run_then_failed_and_recorded_in_diagnostic_log() {
    // Given
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("debug.log");
    let channel = FakeChannel {
        fail_check: true,
        ..FakeChannel::default()
    };
    let coordinator = UpdateCoordinator::new(
        channel,
        accept_all(),
        RunMode::Packaged,
        settings(),
        DiagnosticLog::open(&path),
    );

    // When
    let outcome = coordinator.run().await;

    // Then
    assert!(matches!(outcome, UpdateOutcome::Failed(message) if message.contains("feed unreachable")));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("Auto-update error: Update failed: feed unreachable"));
}

impl UpdateCoordinator<FakeChannel, FakePrompt> {
    fn channel_checks(&self) -> usize {
        self.channel().checks.load(Ordering::SeqCst)
    }
}
