//! Session outcomes.

use serde::Serialize;

use crate::secret::Secret;

/// Lines of output shown in a human-readable summary.
const SUMMARY_TAIL_LINES: usize = 6;

/// Terminal status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    /// The process ran to end-of-stream (with or without prompts answered),
    /// or a `Stop` reaction fired.
    Completed,
    /// The stream ended before any marker matched, and the session required
    /// a match.
    PromptNotFound,
    /// No matching output arrived within the wait bound.
    TimedOut,
    /// Spawn failure, I/O failure, cancellation, or a `Fail` reaction.
    ProcessError,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::PromptNotFound => "prompt-not-found",
            Self::TimedOut => "timed-out",
            Self::ProcessError => "process-error",
        };
        f.write_str(s)
    }
}

/// The final, immutable record of one session.
///
/// Whatever the status, `output` holds everything the process printed up to
/// the point the session ended; partial output is never discarded.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Terminal status.
    pub status: OutcomeStatus,
    /// Accumulated process output (lossy UTF-8).
    pub output: String,
    /// Number of responses injected into the process input.
    pub responses: usize,
    /// Child exit code, when the reap observed a normal exit.
    pub exit_code: Option<i32>,
    /// Classified detail for non-completed outcomes.
    pub detail: Option<String>,
}

impl Outcome {
    pub(crate) fn new(status: OutcomeStatus, output: String) -> Self {
        Self {
            status,
            output,
            responses: 0,
            exit_code: None,
            detail: None,
        }
    }

    pub(crate) fn with_responses(mut self, responses: usize) -> Self {
        self.responses = responses;
        self
    }

    pub(crate) fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Check whether the session completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Completed)
    }

    /// A human-readable one-block summary: status, detail, and the tail of
    /// the output with the secret scrubbed.
    #[must_use]
    pub fn summary(&self, secret: Option<&Secret>) -> String {
        let mut out = format!("status: {}", self.status);
        if let Some(code) = self.exit_code {
            out.push_str(&format!(" (exit code {code})"));
        }
        if let Some(ref detail) = self.detail {
            out.push_str(&format!("\n{detail}"));
        }
        let shown = match secret {
            Some(secret) => secret.redact(&self.output),
            None => self.output.clone(),
        };
        out.push('\n');
        out.push_str(&output_tail(&shown));
        out
    }
}

/// Format the tail of captured output, truncating long transcripts.
fn output_tail(output: &str) -> String {
    if output.is_empty() {
        return "(no output)".to_string();
    }

    let lines: Vec<&str> = output.lines().collect();
    if lines.len() <= SUMMARY_TAIL_LINES {
        return output.trim_end().to_string();
    }

    let hidden = lines.len() - SUMMARY_TAIL_LINES;
    let tail = &lines[hidden..];
    format!("... ({hidden} lines hidden)\n{}", tail.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(OutcomeStatus::Completed.to_string(), "completed");
        assert_eq!(OutcomeStatus::PromptNotFound.to_string(), "prompt-not-found");
        assert_eq!(OutcomeStatus::TimedOut.to_string(), "timed-out");
        assert_eq!(OutcomeStatus::ProcessError.to_string(), "process-error");
    }

    #[test]
    fn summary_redacts_secret() {
        let secret = Secret::new("hunter2");
        let outcome = Outcome::new(
            OutcomeStatus::Completed,
            "Password: hunter2\ndone\n".to_string(),
        );
        let summary = outcome.summary(Some(&secret));
        assert!(!summary.contains("hunter2"));
        assert!(summary.contains("[REDACTED]"));
        assert!(summary.contains("done"));
    }

    #[test]
    fn summary_empty_output() {
        let outcome = Outcome::new(OutcomeStatus::TimedOut, String::new());
        assert!(outcome.summary(None).contains("(no output)"));
    }

    #[test]
    fn summary_truncates_long_output() {
        let output: String = (0..40).map(|i| format!("line {i}\n")).collect();
        let outcome = Outcome::new(OutcomeStatus::Completed, output);
        let summary = outcome.summary(None);
        assert!(summary.contains("lines hidden"));
        assert!(summary.contains("line 39"));
        assert!(!summary.contains("line 0\n"));
    }

    #[test]
    fn serializes_kebab_case_status() {
        let outcome = Outcome::new(OutcomeStatus::PromptNotFound, String::new());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "prompt-not-found");
    }
}
