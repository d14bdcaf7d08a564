//! promptrun-pty: async pseudo-terminal plumbing for promptrun.
//!
//! This crate allocates a PTY pair, spawns a child process on the slave side
//! with a proper session and controlling terminal, and exposes the master
//! side as an async byte stream. Interactive programs that suppress their
//! prompts on non-terminal output (notably `su` and `sudo`) behave normally
//! when driven through it.
//!
//! # Quick Start
//!
//! ```ignore
//! use promptrun_pty::{spawn, PtyConfig};
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), promptrun_pty::PtyError> {
//!     let (mut stream, mut child) = spawn("sh", ["-c", "echo hello"], &PtyConfig::default())?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = stream.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     child.wait().await?;
//!     Ok(())
//! }
//! ```
//!
//! Unix only: the automaton this crate serves drives `su`-style password
//! prompts, which have no Windows counterpart.

#![cfg(unix)]

pub mod child;
pub mod config;
pub mod error;
pub mod master;

pub use child::{ExitStatus, PtyChild};
pub use config::{PtyConfig, PtyConfigBuilder, WindowSize};
pub use error::{PtyError, Result};
pub use master::PtyStream;

/// Allocate a PTY and spawn `program` on its slave side.
///
/// Returns the master stream and the child handle. The caller owns both for
/// the lifetime of the session and is responsible for reaping the child.
///
/// # Errors
///
/// Returns an error if PTY allocation or process spawning fails. On spawn
/// failure the already-allocated master is dropped, closing the PTY.
pub fn spawn<S, I>(program: S, args: I, config: &PtyConfig) -> Result<(PtyStream, PtyChild)>
where
    S: AsRef<std::ffi::OsStr>,
    I: IntoIterator,
    I::Item: AsRef<std::ffi::OsStr>,
{
    let (stream, slave_path) = PtyStream::open()?;
    stream.set_window_size(config.window_size.into())?;

    let slave = master::open_slave(&slave_path)?;
    let child = child::spawn_child(slave, program, args, config)?;
    tracing::debug!(slave = %slave_path, pid = child.pid(), "spawned child on pty");

    Ok((stream, child))
}
