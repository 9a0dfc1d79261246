//! OS process seam: spawning the backend and signalling its process tree.

use crate::{DiagnosticLog, LaunchCommand, ShellError, ShellResult};

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// A freshly spawned backend child.
#[derive(Debug)]
pub struct SpawnedChild {
    pub pid: u32,
    /// Resolves with the exit code once the child exits (`None` when killed by a signal)
    pub exit: oneshot::Receiver<Option<i32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSignal {
    /// SIGTERM / `taskkill /T`
    Graceful,
    /// SIGKILL / `taskkill /T /F`
    Force,
}

pub trait ProcessHost: Send + Sync + 'static {
    /// Spawn `command`, forwarding its output streams line by line into `log`.
    fn spawn(&self, command: &LaunchCommand, log: &DiagnosticLog) -> ShellResult<SpawnedChild>;

    /// Signal `pid` and every process it spawned.
    fn signal_tree(&self, pid: u32, signal: TreeSignal) -> ShellResult<()>;
}

/// Real processes via `tokio::process`.
///
/// On Unix the child leads its own process group so the whole tree can be
/// signalled at once. On Windows no console window is opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProcessHost;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

impl ProcessHost for OsProcessHost {
    fn spawn(&self, command: &LaunchCommand, log: &DiagnosticLog) -> ShellResult<SpawnedChild> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            // Inherited environment passes through untouched, backend variables win
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        cmd.process_group(0);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd
            .spawn()
            .map_err(|e| ShellError::spawn_failed(&command.program, e))?;

        let Some(pid) = child.id() else {
            return Err(ShellError::spawn_failed(
                &command.program,
                std::io::Error::other("process exited before a pid was assigned"),
            ));
        };

        info!("Spawned backend with PID {pid}");

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, "STDOUT", log.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, "STDERR", log.clone()));
        }

        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!("Failed to wait on backend {pid}: {e}");
                    None
                }
            };
            let _ = exit_tx.send(code);
        });

        Ok(SpawnedChild { pid, exit: exit_rx })
    }

    #[cfg(unix)]
    fn signal_tree(&self, pid: u32, signal: TreeSignal) -> ShellResult<()> {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid)
            .map_err(|_| ShellError::signal(pid, "pid out of range for a process group"))?;
        let sig = match signal {
            TreeSignal::Graceful => Signal::SIGTERM,
            TreeSignal::Force => Signal::SIGKILL,
        };

        debug!("Sending {sig:?} to process group {pid}");
        match killpg(Pid::from_raw(raw), sig) {
            // The whole group is already gone
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            result => result.map_err(|e| ShellError::signal(pid, e.to_string())),
        }
    }

    #[cfg(windows)]
    fn signal_tree(&self, pid: u32, signal: TreeSignal) -> ShellResult<()> {
        use std::os::windows::process::CommandExt;

        let pid_arg = pid.to_string();
        let mut args = vec!["/PID", pid_arg.as_str(), "/T"];
        if signal == TreeSignal::Force {
            args.push("/F");
        }

        debug!("Running taskkill {}", args.join(" "));
        let output = std::process::Command::new("taskkill")
            .args(&args)
            .creation_flags(CREATE_NO_WINDOW)
            .output()
            .map_err(|e| ShellError::signal(pid, e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ShellError::signal(
                pid,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

async fn forward_lines<R>(stream: R, label: &'static str, log: DiagnosticLog)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                log.append(&format!("[Backend {label}]: {line}"));
            }
            Err(e) => {
                debug!("Backend {label} stream closed: {e}");
                break;
            }
        }
    }
}
