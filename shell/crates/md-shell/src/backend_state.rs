use tokio::time::Instant;

/// Current state of the supervised backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendState {
    /// Nothing has been spawned yet
    NotStarted,
    /// A spawn is in progress
    Starting,
    /// The process is alive
    Running { pid: u32, generation: u64 },
    /// The process exited on its own and a restart may follow
    Exited { code: Option<i32> },
    /// Termination has been requested
    Terminating { pid: u32 },
    /// Exited after shutdown was requested
    Stopped,
    /// Spawn failed or the restart ceiling was reached
    Failed { error: String },
}

impl BackendState {
    pub fn is_running(&self) -> bool {
        matches!(self, BackendState::Running { .. })
    }
}

/// The single live backend instance.
#[derive(Debug, Clone)]
pub struct BackendProcess {
    pub pid: u32,
    /// Increments on every successful spawn
    pub generation: u64,
    pub started_at: Instant,
}

/// Result of a termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    NotRunning,
    Graceful,
    /// The graceful signal failed and the tree was force-killed
    Forced,
    AlreadyShuttingDown,
}
