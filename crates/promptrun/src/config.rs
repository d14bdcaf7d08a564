//! Configuration for the automaton.

use std::time::Duration;

use promptrun_pty::PtyConfig;

/// Default wait bound for a session.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default grace period for draining output after end-of-interaction.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default shell used to interpret command strings.
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// How the wait bound is applied.
///
/// The two semantics differ materially for multi-prompt interactions, so
/// the choice is explicit rather than implied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutScope {
    /// Each wait cycle gets the full bound; any new output resets the
    /// clock. A session that keeps producing data can run indefinitely.
    #[default]
    PerRead,
    /// One deadline for the whole session, armed at spawn.
    Cumulative,
}

/// Line terminator appended to injected responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// Unix-style line ending (LF).
    #[default]
    Lf,
    /// Windows-style line ending (CRLF).
    CrLf,
    /// Carriage return only.
    Cr,
}

impl LineEnding {
    /// Get the line ending as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// Configuration for [`Automaton`](crate::Automaton).
#[derive(Debug, Clone)]
pub struct AutomatonConfig {
    /// Shell used to interpret the command string (`<shell> -c <command>`).
    pub shell: String,

    /// Wait bound for output.
    pub timeout: Duration,

    /// Whether `timeout` applies per wait cycle or to the whole session.
    pub timeout_scope: TimeoutScope,

    /// Line terminator for injected responses.
    pub line_ending: LineEnding,

    /// Treat end-of-stream without any marker match as `PromptNotFound`
    /// instead of `Completed`.
    ///
    /// Off by default: non-interactive commands that simply run and exit
    /// are a success.
    pub require_match: bool,

    /// Bound on the post-interaction drain (reading trailing output after
    /// a `Stop` reaction fired).
    pub drain_timeout: Duration,

    /// PTY settings for the spawned child.
    pub pty: PtyConfig,
}

impl Default for AutomatonConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            timeout_scope: TimeoutScope::default(),
            line_ending: LineEnding::default(),
            require_match: false,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            pty: PtyConfig::default(),
        }
    }
}

impl AutomatonConfig {
    /// Create a configuration with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shell used to interpret command strings.
    #[must_use]
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set the wait bound.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how the wait bound is applied.
    #[must_use]
    pub const fn timeout_scope(mut self, scope: TimeoutScope) -> Self {
        self.timeout_scope = scope;
        self
    }

    /// Set the line terminator for injected responses.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Require a marker match before end-of-stream.
    #[must_use]
    pub const fn require_match(mut self, value: bool) -> Self {
        self.require_match = value;
        self
    }

    /// Set the post-interaction drain bound.
    #[must_use]
    pub const fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Set the PTY configuration.
    #[must_use]
    pub fn pty(mut self, pty: PtyConfig) -> Self {
        self.pty = pty;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = AutomatonConfig::new()
            .shell("/bin/bash")
            .timeout(Duration::from_secs(5))
            .timeout_scope(TimeoutScope::Cumulative)
            .require_match(true);

        assert_eq!(config.shell, "/bin/bash");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.timeout_scope, TimeoutScope::Cumulative);
        assert!(config.require_match);
    }

    #[test]
    fn line_ending_as_str() {
        assert_eq!(LineEnding::Lf.as_str(), "\n");
        assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
        assert_eq!(LineEnding::Cr.as_str(), "\r");
    }

    #[test]
    fn default_is_per_read_and_permissive() {
        let config = AutomatonConfig::default();
        assert_eq!(config.timeout_scope, TimeoutScope::PerRead);
        assert!(!config.require_match);
        assert_eq!(config.shell, DEFAULT_SHELL);
    }
}
