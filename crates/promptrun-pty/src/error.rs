//! Error types for the promptrun-pty crate.

use std::io;

/// The error type for PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// Failed to allocate a new PTY pair.
    #[error("failed to allocate PTY: {0}")]
    Create(#[source] io::Error),

    /// Failed to spawn the child process.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] io::Error),

    /// An I/O error occurred on the master stream.
    #[error("PTY I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to resize the terminal.
    #[error("failed to resize PTY: {0}")]
    Resize(#[source] io::Error),

    /// The master side has been closed.
    #[error("PTY has been closed")]
    Closed,

    /// Failed to send a signal to the child process.
    #[error("failed to send signal: {0}")]
    Signal(#[source] io::Error),

    /// Failed to wait for the child process.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),
}

/// A specialized Result type for PTY operations.
pub type Result<T> = std::result::Result<T, PtyError>;

impl From<rustix::io::Errno> for PtyError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(io::Error::from_raw_os_error(errno.raw_os_error()))
    }
}
