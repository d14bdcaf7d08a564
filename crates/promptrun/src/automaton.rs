//! The interactive process automaton.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{AutomatonConfig, TimeoutScope};
use crate::expect::{ExpectSet, Reaction};
use crate::outcome::{Outcome, OutcomeStatus};
use crate::secret::Secret;
use crate::session::{ReadEvent, Session, SessionState};

/// Runs one opaque command under a PTY, answers recognized prompts, and
/// returns everything the process printed.
///
/// `run` is infallible by contract: spawn failures, I/O failures, timeouts
/// and cancellation are all classified into the returned [`Outcome`], which
/// always carries whatever output had accumulated. Callers never lose
/// partial diagnostic output.
///
/// # Example
///
/// ```ignore
/// use promptrun::{Automaton, ExpectSet, Secret};
///
/// #[tokio::main]
/// async fn main() {
///     let automaton = Automaton::new();
///     let prompts = ExpectSet::secret_prompts(["Password:", "senha:"]);
///     let secret = Secret::new(std::env::var("SU_PASSWORD").unwrap());
///
///     let outcome = automaton
///         .run("su -c 'systemctl reload nginx'", &prompts, &secret)
///         .await;
///     println!("{}", outcome.summary(Some(&secret)));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    config: AutomatonConfig,
}

impl Automaton {
    /// Create an automaton with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an automaton with a custom configuration.
    #[must_use]
    pub const fn with_config(config: AutomatonConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &AutomatonConfig {
        &self.config
    }

    /// Run `command` to completion.
    ///
    /// The command string is handed to the configured shell (`sh -c` by
    /// default) and attached to a fresh PTY. Output is read continuously;
    /// after each read the expectation set is evaluated in list order
    /// against the unconsumed tail of the buffer, and the winning entry's
    /// reaction is performed. The secret is written to the process input
    /// only when a [`Reaction::SendSecret`] entry matches, never
    /// unsolicited, and a matched occurrence fires exactly once.
    ///
    /// End-of-stream finalizes the session as completed (or
    /// prompt-not-found when [`require_match`](AutomatonConfig::require_match)
    /// is set and nothing ever matched). Silence longer than the configured
    /// bound finalizes it as timed-out. Every path reaps the child and
    /// closes the PTY before returning.
    pub async fn run(&self, command: &str, expectations: &ExpectSet, secret: &Secret) -> Outcome {
        let cancel = CancellationToken::new();
        run_inner(&self.config, command, expectations, secret, &cancel).await
    }

    /// Run `command` with an explicit wait bound, overriding the configured
    /// timeout for this invocation only.
    pub async fn run_with_timeout(
        &self,
        command: &str,
        expectations: &ExpectSet,
        secret: &Secret,
        timeout: Duration,
    ) -> Outcome {
        let config = self.config.clone().timeout(timeout);
        let cancel = CancellationToken::new();
        run_inner(&config, command, expectations, secret, &cancel).await
    }

    /// Run `command`, finalizing early if `cancel` is raised.
    ///
    /// On cancellation the child is killed and the outcome is
    /// `process-error` with the partial output collected so far.
    pub async fn run_with_cancel(
        &self,
        command: &str,
        expectations: &ExpectSet,
        secret: &Secret,
        cancel: &CancellationToken,
    ) -> Outcome {
        run_inner(&self.config, command, expectations, secret, cancel).await
    }
}

async fn run_inner(
    config: &AutomatonConfig,
    command: &str,
    expectations: &ExpectSet,
    secret: &Secret,
    cancel: &CancellationToken,
) -> Outcome {
    if command.trim().is_empty() {
        return Outcome::new(OutcomeStatus::ProcessError, String::new())
            .with_detail("empty command");
    }
    if expectations.is_empty() {
        return Outcome::new(OutcomeStatus::ProcessError, String::new())
            .with_detail("empty expectation set");
    }

    let mut session = match Session::spawn(&config.shell, &["-c", command], &config.pty) {
        Ok(session) => session,
        Err(e) => {
            return Outcome::new(OutcomeStatus::ProcessError, String::new())
                .with_detail(e.to_string());
        }
    };

    let deadline = Instant::now() + config.timeout;
    let mut responses = 0usize;
    let mut matched_any = false;
    session.set_state(SessionState::Waiting);

    let (status, detail) = loop {
        // Scan buffered-but-unconsumed output before blocking again; a
        // single chunk can carry more than one prompt.
        if let Some(matched) = expectations.find_match(session.unread_tail()) {
            matched_any = true;
            let marker = matched.expectation.marker.as_str().to_string();
            let consumed = matched.at.end;

            match &matched.expectation.reaction {
                Reaction::SendSecret => {
                    debug!(marker, "prompt matched, responding with secret");
                    session.set_state(SessionState::Responding);
                    if let Err(e) = session.send_line(secret.expose(), config.line_ending).await {
                        break (OutcomeStatus::ProcessError, Some(e.to_string()));
                    }
                    responses += 1;
                    session.consume_to(consumed);
                    session.set_state(SessionState::Waiting);
                    continue;
                }
                Reaction::SendText(text) => {
                    debug!(marker, "prompt matched, responding with text");
                    session.set_state(SessionState::Responding);
                    let text = text.clone();
                    if let Err(e) = session.send_line(&text, config.line_ending).await {
                        break (OutcomeStatus::ProcessError, Some(e.to_string()));
                    }
                    responses += 1;
                    session.consume_to(consumed);
                    session.set_state(SessionState::Waiting);
                    continue;
                }
                Reaction::Stop => {
                    debug!(marker, "stop marker matched, draining");
                    session.consume_to(consumed);
                    session.set_state(SessionState::Draining);
                    if let Err(e) = session.drain(config.drain_timeout).await {
                        break (OutcomeStatus::ProcessError, Some(e.to_string()));
                    }
                    break (OutcomeStatus::Completed, None);
                }
                Reaction::Fail => {
                    session.consume_to(consumed);
                    break (
                        OutcomeStatus::ProcessError,
                        Some(format!("failure marker matched: {marker:?}")),
                    );
                }
            }
        }

        let wait = match config.timeout_scope {
            TimeoutScope::PerRead => config.timeout,
            TimeoutScope::Cumulative => deadline.saturating_duration_since(Instant::now()),
        };
        if wait.is_zero() {
            break (
                OutcomeStatus::TimedOut,
                Some(format!("no matching output within {:?}", config.timeout)),
            );
        }

        let event = tokio::select! {
            () = cancel.cancelled() => {
                debug!("cancellation raised, terminating session");
                break (OutcomeStatus::ProcessError, Some("session cancelled".to_string()));
            }
            event = session.read_chunk(wait) => event,
        };

        match event {
            Ok(ReadEvent::Data(_)) => {}
            Ok(ReadEvent::Eof) => {
                session.set_state(SessionState::Draining);
                if matched_any || !config.require_match {
                    break (OutcomeStatus::Completed, None);
                }
                break (
                    OutcomeStatus::PromptNotFound,
                    Some("stream ended before any expected marker".to_string()),
                );
            }
            Ok(ReadEvent::Idle) => {
                break (
                    OutcomeStatus::TimedOut,
                    Some(format!("no matching output within {:?}", config.timeout)),
                );
            }
            Err(e) => break (OutcomeStatus::ProcessError, Some(e.to_string())),
        }
    };

    let exit_code = session.terminate().await;
    debug!(%status, responses, ?exit_code, "session finalized");

    let mut outcome = Outcome::new(status, session.output().to_string())
        .with_responses(responses)
        .with_exit_code(exit_code);
    if let Some(detail) = detail {
        outcome = outcome.with_detail(detail);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Secret {
        Secret::new("sesame")
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let automaton = Automaton::new();
        let set = ExpectSet::secret_prompts(["Password:"]);
        let outcome = automaton.run("   ", &set, &secret()).await;

        assert_eq!(outcome.status, OutcomeStatus::ProcessError);
        assert_eq!(outcome.detail.as_deref(), Some("empty command"));
    }

    #[tokio::test]
    async fn empty_expectation_set_is_rejected() {
        let automaton = Automaton::new();
        let outcome = automaton.run("echo hi", &ExpectSet::new(), &secret()).await;

        assert_eq!(outcome.status, OutcomeStatus::ProcessError);
        assert_eq!(outcome.detail.as_deref(), Some("empty expectation set"));
    }

    #[tokio::test]
    async fn stop_reaction_completes() {
        let automaton = Automaton::new();
        let set = ExpectSet::new().on("ready", Reaction::Stop);
        let outcome = automaton
            .run("echo ready; echo trailing", &set, &secret())
            .await;

        assert!(outcome.is_completed());
        assert_eq!(outcome.responses, 0);
        assert!(outcome.output.contains("ready"));
    }

    #[tokio::test]
    async fn fail_reaction_classifies_as_process_error() {
        let automaton = Automaton::new();
        let set = ExpectSet::new()
            .on("Password:", Reaction::SendSecret)
            .on("authentication failure", Reaction::Fail);
        let outcome = automaton
            .run("echo authentication failure", &set, &secret())
            .await;

        assert_eq!(outcome.status, OutcomeStatus::ProcessError);
        assert!(outcome.detail.unwrap().contains("authentication failure"));
        assert!(outcome.output.contains("authentication failure"));
    }

    #[tokio::test]
    async fn require_match_turns_eof_into_prompt_not_found() {
        let config = AutomatonConfig::new().require_match(true);
        let automaton = Automaton::with_config(config);
        let set = ExpectSet::secret_prompts(["Password:"]);
        let outcome = automaton.run("echo no prompt here", &set, &secret()).await;

        assert_eq!(outcome.status, OutcomeStatus::PromptNotFound);
        assert!(outcome.output.contains("no prompt here"));
    }

    #[tokio::test]
    async fn cancellation_yields_process_error_with_partial_output() {
        let automaton = Automaton::new();
        let set = ExpectSet::secret_prompts(["Password:"]);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let outcome = automaton
            .run_with_cancel("echo started; sleep 600", &set, &secret(), &cancel)
            .await;

        assert_eq!(outcome.status, OutcomeStatus::ProcessError);
        assert_eq!(outcome.detail.as_deref(), Some("session cancelled"));
        assert!(outcome.output.contains("started"));
    }
}
