//! Child process spawning and lifecycle management.

use std::ffi::OsStr;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};
use std::process::Stdio;

use rustix::process::{Pid, Signal, kill_process};
use tokio::process::{Child as TokioChild, Command};

use crate::config::PtyConfig;
use crate::error::{PtyError, Result};

/// Exit status of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The process exited normally with the given exit code.
    Exited(i32),
    /// The process was terminated by a signal.
    Signaled(i32),
}

impl ExitStatus {
    /// Check if the process exited successfully (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Get the exit code, if the process exited normally.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Signaled(_) => None,
        }
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Signaled(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

/// Handle for a child process spawned on a PTY slave.
pub struct PtyChild {
    child: TokioChild,
    pid: u32,
    exit_status: Option<ExitStatus>,
}

impl std::fmt::Debug for PtyChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChild")
            .field("pid", &self.pid)
            .field("exit_status", &self.exit_status)
            .finish()
    }
}

impl PtyChild {
    /// Get the process ID of the child.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// The exit status, if the child has already been reaped.
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Wait for the child to exit and reap it.
    ///
    /// Idempotent: repeated calls return the cached status.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        let status = self.child.wait().await.map_err(PtyError::Wait)?;
        let status = convert_exit_status(status);
        self.exit_status = Some(status);
        Ok(status)
    }

    /// Check for exit without blocking. Returns `None` while still running.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.exit_status {
            return Ok(Some(status));
        }

        match self.child.try_wait().map_err(PtyError::Wait)? {
            Some(status) => {
                let status = convert_exit_status(status);
                self.exit_status = Some(status);
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Send a signal to the child process.
    pub fn signal(&self, signal: i32) -> Result<()> {
        if self.exit_status.is_some() {
            return Ok(());
        }

        let pid = Pid::from_raw(self.pid as i32).ok_or_else(|| {
            PtyError::Signal(io::Error::new(io::ErrorKind::InvalidInput, "invalid pid"))
        })?;
        let signal = Signal::from_named_raw(signal).ok_or_else(|| {
            PtyError::Signal(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid signal",
            ))
        })?;

        kill_process(pid, signal)
            .map_err(|e| PtyError::Signal(io::Error::from_raw_os_error(e.raw_os_error())))
    }

    /// Ask the child to terminate (SIGTERM).
    pub fn terminate(&self) -> Result<()> {
        self.signal(libc::SIGTERM)
    }

    /// Kill the child (SIGKILL) and reap it.
    pub async fn kill(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        self.child.kill().await.map_err(PtyError::Signal)?;
        self.wait().await
    }
}

/// Convert `std::process::ExitStatus` to our `ExitStatus`.
fn convert_exit_status(status: std::process::ExitStatus) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    if let Some(code) = status.code() {
        ExitStatus::Exited(code)
    } else if let Some(signal) = status.signal() {
        ExitStatus::Signaled(signal)
    } else {
        ExitStatus::Exited(-1)
    }
}

/// Spawn a child process with its stdio attached to the given PTY slave.
pub(crate) fn spawn_child<S, I>(
    slave_fd: OwnedFd,
    program: S,
    args: I,
    config: &PtyConfig,
) -> Result<PtyChild>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let slave_raw = slave_fd.as_raw_fd();
    let controlling = config.controlling_terminal;

    let mut cmd = Command::new(program.as_ref());
    cmd.args(args);
    cmd.env_clear();
    cmd.envs(config.effective_env());

    if let Some(ref dir) = config.working_directory {
        cmd.current_dir(dir);
    }

    // Each stdio stream gets its own dup of the slave; the OwnedFd closes
    // the original when this function returns.
    // SAFETY: slave_raw is a valid fd owned by slave_fd; dup produces fresh
    // descriptors whose ownership transfers to Stdio.
    #[allow(unsafe_code)]
    unsafe {
        cmd.stdin(Stdio::from_raw_fd(libc::dup(slave_raw)));
        cmd.stdout(Stdio::from_raw_fd(libc::dup(slave_raw)));
        cmd.stderr(Stdio::from_raw_fd(libc::dup(slave_raw)));
    }

    if controlling {
        // SAFETY: setsid and ioctl are async-signal-safe; slave_raw remains
        // open in the child at this point via the inherited stdio fds.
        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(move || {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                if libc::ioctl(0, libc::TIOCSCTTY, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    } else {
        cmd.process_group(0);
    }

    // Backstop only; the session owning this handle reaps explicitly.
    cmd.kill_on_drop(true);

    let child = cmd.spawn().map_err(PtyError::Spawn)?;
    let pid = child.id().ok_or_else(|| {
        PtyError::Spawn(io::Error::other("spawned child has no pid"))
    })?;

    Ok(PtyChild {
        child,
        pid,
        exit_status: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_success() {
        let status = ExitStatus::Exited(0);
        assert!(status.success());
        assert_eq!(status.code(), Some(0));
    }

    #[test]
    fn exit_status_signaled() {
        let status = ExitStatus::Signaled(9);
        assert!(!status.success());
        assert_eq!(status.code(), None);
        assert_eq!(status.to_string(), "terminated by signal 9");
    }

    #[tokio::test]
    async fn wait_is_idempotent() {
        let (_stream, mut child) = crate::spawn(
            "sh",
            ["-c", "exit 3"],
            &crate::PtyConfig::default(),
        )
        .expect("spawn");

        let first = child.wait().await.expect("wait");
        let second = child.wait().await.expect("cached wait");
        assert_eq!(first, second);
        assert_eq!(first.code(), Some(3));
    }

    #[tokio::test]
    async fn kill_hanging_child() {
        let (_stream, mut child) = crate::spawn(
            "sleep",
            ["600"],
            &crate::PtyConfig::default(),
        )
        .expect("spawn");

        let status = child.kill().await.expect("kill");
        assert!(!status.success());
    }
}
