//! Backend process supervision with crash restart.

use crate::{
    BackendProcess, BackendState, CommandSource, DiagnosticLog, LifecycleContext, ProcessHost,
    ShellError, ShellResult, SupervisorPolicy, TerminationOutcome, TreeSignal,
};

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use md_config::SpawnFailurePolicy;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Messages driving the supervisor's event loop.
#[derive(Debug)]
enum SupervisorEvent {
    Exited { generation: u64, code: Option<i32> },
    RestartDue,
}

/// Owns the backend child process.
///
/// Responsibilities:
/// - Spawn the backend with a freshly resolved command
/// - Restart it after an unexpected exit, unless shutdown is in progress
/// - Terminate its process tree, escalating to a forced kill
///
/// At most one backend is live at a time. The handle is only touched while
/// holding `current`, so a restart racing a shutdown cannot double spawn.
#[derive(Clone)]
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

struct Inner {
    host: Arc<dyn ProcessHost>,
    commands: Arc<dyn CommandSource>,
    lifecycle: LifecycleContext,
    log: DiagnosticLog,
    policy: SupervisorPolicy,
    current: Mutex<Option<BackendProcess>>,
    generation: AtomicU64,
    consecutive_restarts: AtomicU32,
    restart_pending: AtomicBool,
    shutdown_started: AtomicBool,
    state_tx: watch::Sender<BackendState>,
    event_tx: mpsc::UnboundedSender<SupervisorEvent>,
    event_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<SupervisorEvent>>>,
}

impl ProcessSupervisor {
    pub fn new(
        host: Arc<dyn ProcessHost>,
        commands: Arc<dyn CommandSource>,
        lifecycle: LifecycleContext,
        log: DiagnosticLog,
        policy: SupervisorPolicy,
    ) -> Self {
        let (state_tx, _) = watch::channel(BackendState::NotStarted);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                host,
                commands,
                lifecycle,
                log,
                policy,
                current: Mutex::new(None),
                generation: AtomicU64::new(0),
                consecutive_restarts: AtomicU32::new(0),
                restart_pending: AtomicBool::new(false),
                shutdown_started: AtomicBool::new(false),
                state_tx,
                event_tx,
                event_rx: std::sync::Mutex::new(Some(event_rx)),
            }),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> BackendState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<BackendState> {
        self.inner.state_tx.subscribe()
    }

    /// PID of the live backend, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.inner.current.lock().await.as_ref().map(|p| p.pid)
    }

    pub fn lifecycle(&self) -> &LifecycleContext {
        &self.inner.lifecycle
    }

    /// Spawn the backend unless one is already live.
    ///
    /// Returns the live PID. Refuses once shutdown has been requested.
    pub async fn start(&self) -> ShellResult<u32> {
        self.ensure_event_loop();

        if self.inner.lifecycle.is_shutdown_requested() {
            return Err(ShellError::shutting_down());
        }

        let mut current = self.inner.current.lock().await;

        if let Some(process) = current.as_ref() {
            debug!("Backend already running with PID {}", process.pid);
            return Ok(process.pid);
        }

        // Intent may have been set while waiting for the lock
        if self.inner.lifecycle.is_shutdown_requested() {
            return Err(ShellError::shutting_down());
        }

        self.set_state(BackendState::Starting);

        let command = self.inner.commands.resolve();
        info!(
            "Starting backend: {} {:?} (cwd {})",
            command.program.display(),
            command.args,
            command.working_dir.display()
        );
        self.inner.log.append("Starting Backend...");
        self.inner
            .log
            .append(&format!("Path: {}", command.program.display()));
        self.inner
            .log
            .append(&format!("CWD: {}", command.working_dir.display()));

        match self.inner.host.spawn(&command, &self.inner.log) {
            Ok(child) => {
                let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let pid = child.pid;

                *current = Some(BackendProcess {
                    pid,
                    generation,
                    started_at: Instant::now(),
                });
                self.set_state(BackendState::Running { pid, generation });
                self.watch_exit(generation, child.exit);

                info!("Backend running with PID {pid} (generation {generation})");
                Ok(pid)
            }
            Err(e) => {
                error!("Failed to start backend: {e}");
                self.inner
                    .log
                    .append(&format!("Failed to start backend: {e}"));
                self.set_state(BackendState::Failed {
                    error: e.to_string(),
                });
                drop(current);

                if self.inner.policy.spawn_failure == SpawnFailurePolicy::Retry {
                    self.schedule_restart();
                }

                Err(e)
            }
        }
    }

    /// Signal the backend tree to stop without waiting for it to exit.
    ///
    /// A failed graceful signal escalates immediately to a forced kill of the
    /// same tree. The exit notification completes the transition.
    pub async fn terminate(&self) -> ShellResult<TerminationOutcome> {
        let current = self.inner.current.lock().await;

        let Some(process) = current.as_ref() else {
            debug!("Terminate requested with no backend running");
            return Ok(TerminationOutcome::NotRunning);
        };

        let pid = process.pid;
        self.set_state(BackendState::Terminating { pid });
        info!("Terminating backend process tree {pid}");

        match self.inner.host.signal_tree(pid, TreeSignal::Graceful) {
            Ok(()) => Ok(TerminationOutcome::Graceful),
            Err(graceful_err) => {
                warn!("Graceful termination of {pid} failed: {graceful_err}, forcing");
                self.inner.log.append(&format!(
                    "Failed to kill backend gracefully: {graceful_err}. Forcing..."
                ));

                match self.inner.host.signal_tree(pid, TreeSignal::Force) {
                    Ok(()) => Ok(TerminationOutcome::Forced),
                    Err(e) => {
                        error!("Forced termination of {pid} failed: {e}");
                        self.inner
                            .log
                            .append(&format!("Failed to force kill backend: {e}"));
                        self.set_state(BackendState::Failed {
                            error: e.to_string(),
                        });
                        Err(e)
                    }
                }
            }
        }
    }

    /// Record shutdown intent, then terminate. Idempotent.
    pub async fn shutdown(&self) -> ShellResult<TerminationOutcome> {
        if self.inner.shutdown_started.swap(true, Ordering::SeqCst) {
            return Ok(TerminationOutcome::AlreadyShuttingDown);
        }

        self.inner.lifecycle.request_shutdown();
        info!("Shutdown requested, backend will not be restarted");

        let outcome = self.terminate().await?;
        if outcome == TerminationOutcome::NotRunning {
            self.set_state(BackendState::Stopped);
        }

        Ok(outcome)
    }

    fn set_state(&self, state: BackendState) {
        debug!("Backend state: {state:?}");
        self.inner.state_tx.send_replace(state);
    }

    fn watch_exit(&self, generation: u64, exit: oneshot::Receiver<Option<i32>>) {
        let event_tx = self.inner.event_tx.clone();

        tokio::spawn(async move {
            // A dropped sender means the waiter died; treat it as an exit
            let code = exit.await.unwrap_or(None);
            let _ = event_tx.send(SupervisorEvent::Exited { generation, code });
        });
    }

    fn ensure_event_loop(&self) {
        let receiver = self
            .inner
            .event_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let Some(mut rx) = receiver else {
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let supervisor = ProcessSupervisor { inner };

                match event {
                    SupervisorEvent::Exited { generation, code } => {
                        supervisor.handle_exit(generation, code).await;
                    }
                    SupervisorEvent::RestartDue => supervisor.handle_restart_due().await,
                }
            }
            debug!("Supervisor event loop stopped");
        });
    }

    async fn handle_exit(&self, generation: u64, code: Option<i32>) {
        let process = self
            .inner
            .current
            .lock()
            .await
            .take_if(|p| p.generation == generation);

        let Some(process) = process else {
            debug!("Ignoring exit of stale backend generation {generation}");
            return;
        };

        let code_text = describe_exit(code);
        info!("Backend {} exited with code {code_text}", process.pid);
        self.inner
            .log
            .append(&format!("Backend process exited with code {code_text}"));

        if self.inner.lifecycle.is_shutdown_requested() {
            self.set_state(BackendState::Stopped);
            return;
        }

        self.set_state(BackendState::Exited { code });

        if process.started_at.elapsed() >= self.inner.policy.restart.stable_after {
            self.inner.consecutive_restarts.store(0, Ordering::SeqCst);
        }

        self.schedule_restart();
    }

    async fn handle_restart_due(&self) {
        self.inner.restart_pending.store(false, Ordering::SeqCst);

        if self.inner.lifecycle.is_shutdown_requested() {
            debug!("Restart skipped, shutdown in progress");
            return;
        }

        if let Err(e) = self.start().await {
            warn!("Backend restart failed: {e}");
        }
    }

    fn schedule_restart(&self) {
        if self.inner.lifecycle.is_shutdown_requested() {
            return;
        }

        if self.inner.restart_pending.swap(true, Ordering::SeqCst) {
            debug!("Restart already scheduled");
            return;
        }

        let attempt = self.inner.consecutive_restarts.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(delay) = self.inner.policy.restart.delay_for(attempt) else {
            self.inner.restart_pending.store(false, Ordering::SeqCst);
            let max = self.inner.policy.restart.max_restarts.unwrap_or_default();
            error!("Backend exceeded {max} consecutive restarts, giving up");
            self.inner
                .log
                .append(&format!("Backend exceeded {max} restarts. Not restarting."));
            self.set_state(BackendState::Failed {
                error: format!("maximum restart attempts ({max}) exceeded"),
            });
            return;
        };

        warn!(
            "Backend restart {attempt} scheduled in {}ms",
            delay.as_millis()
        );
        self.inner.log.append(&format!(
            "Backend exited unexpectedly. Restarting in {} seconds...",
            delay.as_secs_f64()
        ));

        let event_tx = self.inner.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(SupervisorEvent::RestartDue);
        });
    }
}

fn describe_exit(code: Option<i32>) -> String {
    code.map_or_else(|| String::from("null"), |c| c.to_string())
}
