//! Error types for promptrun.
//!
//! These cover the fallible internals (spawning, PTY I/O). The public
//! [`Automaton::run`](crate::Automaton::run) surface is infallible by
//! contract: every failure is classified into an
//! [`Outcome`](crate::Outcome) that still carries the accumulated output.

use std::io;

use thiserror::Error;

/// Errors raised while driving a session.
#[derive(Debug, Error)]
pub enum RunError {
    /// The child process could not be spawned.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] promptrun_pty::PtyError),

    /// An I/O operation on the session failed.
    #[error("{context}: {source}")]
    Io {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The caller raised the cancellation signal.
    #[error("session cancelled")]
    Cancelled,
}

impl RunError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display_includes_context() {
        let err = RunError::io(
            "writing response to process",
            io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
        );
        let msg = err.to_string();
        assert!(msg.contains("writing response to process"));
        assert!(msg.contains("pipe closed"));
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(RunError::Cancelled.to_string(), "session cancelled");
    }
}
