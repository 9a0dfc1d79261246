//! Core of the MeaDocs desktop shell.
//!
//! Launches the local backend, keeps exactly one instance alive, gates the
//! UI on its readiness and decides when self-updates run. Nothing here
//! depends on the GUI toolkit: windows, dialogs and the update feed are
//! reached through [`ShellWindow`], [`UpdatePrompt`] and [`UpdateChannel`].

mod backend_state;
mod content;
mod diagnostics;
mod error;
mod host_info;
mod launcher;
mod lifecycle;
mod process;
mod readiness;
mod restart_policy;
mod supervisor;
mod update;

pub use backend_state::{BackendProcess, BackendState, TerminationOutcome};
pub use content::{ContentLoader, LoadSettings, PAGE_LOADED_COMMAND, ShellWindow};
pub use diagnostics::{DiagnosticLog, install_panic_hook};
pub use error::{Result as ShellResult, ShellError};
pub use host_info::{BRIDGE_GLOBAL, HostInfo, LEGACY_BRIDGE_GLOBAL, platform_id};
pub use launcher::{
    BackendLauncher, CommandSource, ENV_ENTRY_POINT, ENV_UNBUFFERED, LaunchCommand, LaunchPaths,
    effective_environment,
};
pub use lifecycle::LifecycleContext;
pub use process::{OsProcessHost, ProcessHost, SpawnedChild, TreeSignal};
pub use readiness::{
    ProbeOutcome, ProbeSettings, ReadinessOutcome, ReadinessProbe, ReadyEvent,
    spawn_readiness_watch,
};
pub use restart_policy::{RestartPolicy, SupervisorPolicy};
pub use supervisor::ProcessSupervisor;
pub use update::{
    AvailableUpdate, UpdateChannel, UpdateCoordinator, UpdateOutcome, UpdatePrompt,
    UpdateSettings,
};

#[cfg(test)]
mod tests;
