//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default environment variable consulted for the secret.
pub const DEFAULT_SECRET_ENV: &str = "PROMPTRUN_SECRET";

/// Drive interactive privileged commands: answer their prompts, collect
/// their output, report each outcome.
#[derive(Debug, Parser)]
#[command(name = "promptrun", version, about)]
pub struct Cli {
    /// Environment variable holding the secret.
    #[arg(long, global = true, default_value = DEFAULT_SECRET_ENV)]
    pub secret_env: String,

    /// Read the secret from this file instead (takes precedence over the
    /// environment variable; trailing newline stripped).
    #[arg(long, global = true)]
    pub secret_file: Option<PathBuf>,

    /// Emit outcome reports as JSON instead of human-readable summaries.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a provisioning plan from a TOML file.
    Run {
        /// Path to the plan file.
        #[arg(long)]
        plan: PathBuf,

        /// Abort the sequence at the first non-completed step and exit
        /// non-zero. Without this flag every step runs and the exit code
        /// is 0 regardless of individual outcomes.
        #[arg(long)]
        fail_fast: bool,
    },

    /// Run a single command.
    Exec {
        /// The command, interpreted by the shell.
        command: String,

        /// Prompt marker answered with the secret. Repeatable; listed
        /// order is match precedence.
        #[arg(long = "prompt")]
        prompts: Vec<String>,

        /// Wait bound in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Treat end-of-stream without a recognized prompt as a failure.
        #[arg(long)]
        require_match: bool,

        /// Exit non-zero when the outcome is not `completed`.
        #[arg(long)]
        fail_fast: bool,
    },
}
