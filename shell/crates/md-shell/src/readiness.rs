//! Readiness gating: poll the backend until it answers 200.

use crate::{BackendState, LifecycleContext, ShellError, ShellResult};

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use error_location::ErrorLocation;
use md_config::{BackendConfig, ReadinessConfig};
use reqwest::StatusCode;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Pause between failed probes
    pub interval: Duration,
    /// Per-request ceiling so a hung socket cannot stall the loop
    pub request_timeout: Duration,
}

impl From<&ReadinessConfig> for ProbeSettings {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.probe_interval_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready,
    NotReady(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready { attempts: u32 },
    /// Shutdown was requested before the backend answered
    Abandoned { attempts: u32 },
}

/// Emitted once per backend generation that answered a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyEvent {
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    client: reqwest::Client,
    url: Url,
    interval: Duration,
}

impl ReadinessProbe {
    pub fn new(url: Url, settings: ProbeSettings) -> ShellResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            url,
            interval: settings.interval,
        })
    }

    pub fn from_config(backend: &BackendConfig, readiness: &ReadinessConfig) -> ShellResult<Self> {
        let raw = backend.url();
        let url = Url::parse(&raw).map_err(|source| ShellError::InvalidUrl {
            url: raw.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        Self::new(url, ProbeSettings::from(readiness))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Single GET against the backend root. Only status 200 counts as ready.
    pub async fn probe_once(&self) -> ProbeOutcome {
        match self.client.get(self.url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => ProbeOutcome::Ready,
            Ok(response) => ProbeOutcome::NotReady(format!("HTTP {}", response.status())),
            Err(e) => ProbeOutcome::NotReady(e.to_string()),
        }
    }

    /// Probe every `interval` until the backend answers 200.
    ///
    /// No attempt ceiling and no backoff. The only early exit is a requested
    /// shutdown, checked before every retry.
    pub async fn poll_until_ready(&self, lifecycle: &LifecycleContext) -> ReadinessOutcome {
        let mut attempts = 0;

        loop {
            if lifecycle.is_shutdown_requested() {
                debug!("Readiness polling abandoned after {attempts} attempts");
                return ReadinessOutcome::Abandoned { attempts };
            }

            attempts += 1;
            match self.probe_once().await {
                ProbeOutcome::Ready => {
                    info!("Backend ready at {} after {attempts} probes", self.url);
                    return ReadinessOutcome::Ready { attempts };
                }
                ProbeOutcome::NotReady(reason) => {
                    debug!("Backend not ready (attempt {attempts}): {reason}");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = lifecycle.shutdown_requested() => {}
            }
        }
    }

    /// Poll until ready, then invoke `on_ready` exactly once.
    pub async fn wait_until_ready<F>(&self, lifecycle: &LifecycleContext, on_ready: F) -> ReadinessOutcome
    where
        F: FnOnce(),
    {
        let outcome = self.poll_until_ready(lifecycle).await;
        if let ReadinessOutcome::Ready { .. } = outcome {
            on_ready();
        }
        outcome
    }
}

/// Follow the supervisor's state and gate each new generation on readiness.
///
/// A fresh probe runs for every `Running` generation. `on_ready` fires at most
/// once per generation, and only if that generation is still the live one.
pub fn spawn_readiness_watch<F>(
    states: watch::Receiver<BackendState>,
    probe: ReadinessProbe,
    lifecycle: LifecycleContext,
    on_ready: F,
) -> JoinHandle<()>
where
    F: Fn(ReadyEvent) + Send + Sync + 'static,
{
    let on_ready = Arc::new(on_ready);

    tokio::spawn(async move {
        let mut states = states;
        let mut probed: Option<u64> = None;
        let mut probing: Option<JoinHandle<()>> = None;

        loop {
            let state = states.borrow_and_update().clone();

            match state {
                BackendState::Running { generation, .. } if probed == Some(generation) => {}
                BackendState::Running { generation, .. } => {
                    if let Some(task) = probing.take() {
                        task.abort();
                    }
                    probed = Some(generation);
                    probing = Some(tokio::spawn(probe_generation(
                        generation,
                        probe.clone(),
                        lifecycle.clone(),
                        states.clone(),
                        on_ready.clone(),
                    )));
                }
                _ => {
                    if let Some(task) = probing.take() {
                        task.abort();
                    }
                }
            }

            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = lifecycle.shutdown_requested() => break,
            }
        }

        if let Some(task) = probing.take() {
            task.abort();
        }
        debug!("Readiness watch stopped");
    })
}

async fn probe_generation<F>(
    generation: u64,
    probe: ReadinessProbe,
    lifecycle: LifecycleContext,
    states: watch::Receiver<BackendState>,
    on_ready: Arc<F>,
) where
    F: Fn(ReadyEvent) + Send + Sync + 'static,
{
    let outcome = probe.poll_until_ready(&lifecycle).await;
    if !matches!(outcome, ReadinessOutcome::Ready { .. }) {
        return;
    }

    let still_current = matches!(
        *states.borrow(),
        BackendState::Running { generation: live, .. } if live == generation
    );

    if still_current && !lifecycle.is_shutdown_requested() {
        on_ready(ReadyEvent { generation });
    } else {
        debug!("Generation {generation} became ready after it was replaced");
    }
}
