//! Session: one spawn-to-termination lifecycle against a single command.

use std::time::Duration;

use promptrun_pty::{PtyChild, PtyConfig, PtyStream};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::trace;

use crate::config::LineEnding;
use crate::error::{Result, RunError};

/// Read buffer size for each wait cycle.
const READ_CHUNK: usize = 4096;

/// Lifecycle state of a session.
///
/// Transitions follow `Spawned → Waiting ⇄ Responding → Draining →
/// Terminated`, with direct `Waiting → Terminated` edges on timeout and
/// I/O failure. `Terminated` is absorbing: no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Child spawned, no wait cycle started yet.
    Spawned,
    /// Blocked on (or about to block on) a read of process output.
    Waiting,
    /// Writing a response to the process input.
    Responding,
    /// Interaction finished; reading trailing output to end-of-stream.
    Draining,
    /// Child reaped, PTY closed. Final.
    Terminated,
}

/// What a wait cycle observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEvent {
    /// New output was appended to the buffer.
    Data(usize),
    /// The process closed its side of the terminal.
    Eof,
    /// Nothing arrived within the wait bound.
    Idle,
}

/// An exclusive handle to one spawned child and its PTY.
///
/// The output buffer is append-only and grows monotonically until the
/// session terminates; matching consumes positions (via [`Session::consume_to`])
/// but never discards bytes, so [`Session::output`] always returns the full
/// transcript.
pub struct Session {
    stream: PtyStream,
    child: PtyChild,
    /// Accumulated output, lossy-decoded per chunk.
    buffer: String,
    /// Start of the unconsumed tail within `buffer`.
    scan_from: usize,
    state: SessionState,
    eof: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pid", &self.child.pid())
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .field("eof", &self.eof)
            .finish()
    }
}

impl Session {
    /// Spawn `program` with `args` under a fresh PTY.
    pub fn spawn(program: &str, args: &[&str], pty: &PtyConfig) -> Result<Self> {
        let (stream, child) = promptrun_pty::spawn(program, args, pty).map_err(RunError::Spawn)?;
        trace!(pid = child.pid(), program, "spawned session child");

        Ok(Self {
            stream,
            child,
            buffer: String::new(),
            scan_from: 0,
            state: SessionState::Spawned,
            eof: false,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether end-of-stream has been observed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.eof
    }

    /// Child process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.child.pid()
    }

    /// The full accumulated output.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.buffer
    }

    /// The portion of the buffer not yet consumed by a match.
    #[must_use]
    pub fn unread_tail(&self) -> &str {
        &self.buffer[self.scan_from..]
    }

    /// Advance the scan position by `len` bytes of the unconsumed tail.
    ///
    /// Consuming moves the matching window forward so a marker occurrence
    /// fires exactly once; the bytes stay in the buffer.
    pub fn consume_to(&mut self, len: usize) {
        self.scan_from = (self.scan_from + len).min(self.buffer.len());
    }

    /// Move to `state`, unless already terminated.
    pub const fn set_state(&mut self, state: SessionState) {
        if !matches!(self.state, SessionState::Terminated) {
            self.state = state;
        }
    }

    /// Run one wait cycle: block up to `timeout` for process output.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Io`] if the read itself fails (as opposed to
    /// timing out, which is an [`ReadEvent::Idle`]).
    pub async fn read_chunk(&mut self, timeout: Duration) -> Result<ReadEvent> {
        if self.eof {
            return Ok(ReadEvent::Eof);
        }

        let mut buf = [0u8; READ_CHUNK];
        match tokio::time::timeout(timeout, self.stream.read(&mut buf)).await {
            Ok(Ok(0)) => {
                self.eof = true;
                Ok(ReadEvent::Eof)
            }
            Ok(Ok(n)) => {
                self.buffer.push_str(&String::from_utf8_lossy(&buf[..n]));
                trace!(bytes = n, total = self.buffer.len(), "read chunk");
                Ok(ReadEvent::Data(n))
            }
            Ok(Err(e)) => Err(RunError::io("reading from process", e)),
            Err(_) => Ok(ReadEvent::Idle),
        }
    }

    /// Write `text` plus a line terminator to the process input.
    pub async fn send_line(&mut self, text: &str, ending: LineEnding) -> Result<()> {
        let data = format!("{text}{}", ending.as_str());
        self.stream
            .write_all(data.as_bytes())
            .await
            .map_err(|e| RunError::io("writing response to process", e))?;
        self.stream
            .flush()
            .await
            .map_err(|e| RunError::io("flushing process input", e))
    }

    /// Read remaining output until end-of-stream, waiting up to `grace`
    /// per cycle.
    pub async fn drain(&mut self, grace: Duration) -> Result<()> {
        while !self.eof {
            match self.read_chunk(grace).await? {
                ReadEvent::Data(_) => {}
                ReadEvent::Eof | ReadEvent::Idle => break,
            }
        }
        Ok(())
    }

    /// Terminate the session: kill the child if it is still running, reap
    /// it, close the PTY.
    ///
    /// Idempotent, and called on every exit path of the automaton. Returns
    /// the child's exit code when the reap observed a normal exit.
    pub async fn terminate(&mut self) -> Option<i32> {
        if !matches!(self.state, SessionState::Terminated) {
            match self.child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    if let Err(e) = self.child.kill().await {
                        trace!(pid = self.child.pid(), error = %e, "kill failed");
                    }
                }
            }
            self.stream.close();
            self.state = SessionState::Terminated;
        }

        self.child.exit_status().and_then(|s| s.code())
    }
}
