mod launcher;
mod update;

use crate::{
    DiagnosticLog, LaunchCommand, LifecycleContext, ProcessHost, ProcessSupervisor, ShellError,
    ShellResult, SpawnedChild, SupervisorPolicy, TreeSignal,
};

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// In-memory process host: children live until the test ends them.
#[derive(Default)]
pub(crate) struct FakeProcessHost {
    state: Mutex<FakeHostState>,
}

#[derive(Default)]
struct FakeHostState {
    next_pid: u32,
    spawned: Vec<LaunchCommand>,
    live: HashMap<u32, oneshot::Sender<Option<i32>>>,
    signals: Vec<(u32, TreeSignal)>,
    fail_spawn: bool,
    fail_graceful: bool,
    exit_on_signal: bool,
}

impl FakeProcessHost {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn exiting_on_signal() -> Arc<Self> {
        let host = Self::default();
        host.state.lock().unwrap().exit_on_signal = true;
        Arc::new(host)
    }

    pub(crate) fn set_fail_spawn(&self, fail: bool) {
        self.state.lock().unwrap().fail_spawn = fail;
    }

    pub(crate) fn set_fail_graceful(&self, fail: bool) {
        self.state.lock().unwrap().fail_graceful = fail;
    }

    pub(crate) fn spawn_count(&self) -> usize {
        self.state.lock().unwrap().spawned.len()
    }

    pub(crate) fn spawned(&self) -> Vec<LaunchCommand> {
        self.state.lock().unwrap().spawned.clone()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    pub(crate) fn signals(&self) -> Vec<(u32, TreeSignal)> {
        self.state.lock().unwrap().signals.clone()
    }

    /// Make `pid` exit with `code`. Returns false if it was not live.
    pub(crate) fn exit(&self, pid: u32, code: Option<i32>) -> bool {
        match self.state.lock().unwrap().live.remove(&pid) {
            Some(tx) => tx.send(code).is_ok(),
            None => false,
        }
    }
}

impl ProcessHost for FakeProcessHost {
    fn spawn(&self, command: &LaunchCommand, _log: &DiagnosticLog) -> ShellResult<SpawnedChild> {
        let mut state = self.state.lock().unwrap();

        if state.fail_spawn {
            return Err(ShellError::spawn_failed(
                &command.program,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ));
        }

        state.next_pid += 1;
        let pid = 1000 + state.next_pid;
        let (tx, rx) = oneshot::channel();
        state.spawned.push(command.clone());
        state.live.insert(pid, tx);

        Ok(SpawnedChild { pid, exit: rx })
    }

    fn signal_tree(&self, pid: u32, signal: TreeSignal) -> ShellResult<()> {
        let mut state = self.state.lock().unwrap();
        state.signals.push((pid, signal));

        if signal == TreeSignal::Graceful && state.fail_graceful {
            return Err(ShellError::signal(pid, "access denied"));
        }

        if state.exit_on_signal
            && let Some(tx) = state.live.remove(&pid)
        {
            let _ = tx.send(None);
        }

        Ok(())
    }
}

pub(crate) fn test_command() -> LaunchCommand {
    LaunchCommand {
        program: PathBuf::from("/opt/meadocs/.venv/bin/python"),
        args: vec![String::from("app.py")],
        working_dir: PathBuf::from("/opt/meadocs"),
        env: BTreeMap::from([
            (String::from("PYTHONUNBUFFERED"), String::from("1")),
            (String::from("FLASK_APP"), String::from("app.py")),
        ]),
    }
}

pub(crate) fn test_supervisor(
    host: Arc<FakeProcessHost>,
    policy: SupervisorPolicy,
) -> (ProcessSupervisor, LifecycleContext) {
    let lifecycle = LifecycleContext::new();
    let supervisor = ProcessSupervisor::new(
        host,
        Arc::new(test_command),
        lifecycle.clone(),
        DiagnosticLog::disabled(),
        policy,
    );
    (supervisor, lifecycle)
}
