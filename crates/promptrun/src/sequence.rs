//! Batch command sequencing: run a fixed list of commands, one session at
//! a time.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::automaton::Automaton;
use crate::expect::ExpectSet;
use crate::outcome::Outcome;
use crate::secret::Secret;

/// What to do when a step does not complete.
///
/// The historical behavior of provisioning scripts in this mold is
/// best-effort: report the failure and keep going. That stays the default;
/// aborting is an explicit, named choice rather than an assumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and run the remaining steps.
    #[default]
    Continue,
    /// Stop the sequence at the first non-completed step.
    FailFast,
}

/// One step of a sequence.
#[derive(Debug, Clone)]
pub struct Step {
    /// Human-readable label, used in logs and reports.
    pub label: String,
    /// The command to run.
    pub command: String,
    /// Expectations for this step's session.
    pub expectations: ExpectSet,
}

impl Step {
    /// Create a step.
    pub fn new(
        label: impl Into<String>,
        command: impl Into<String>,
        expectations: ExpectSet,
    ) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            expectations,
        }
    }
}

/// The recorded outcome of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// The step's label.
    pub label: String,
    /// Its session outcome.
    pub outcome: Outcome,
}

/// The result of running a sequence.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceReport {
    /// Per-step reports, in execution order.
    pub steps: Vec<StepReport>,
    /// Whether a fail-fast policy cut the sequence short.
    pub aborted: bool,
}

impl SequenceReport {
    /// Check whether every executed step completed.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_completed())
    }

    /// Find a step report by label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.label == label)
    }
}

/// Runs steps strictly sequentially: each session is run to termination
/// and its outcome logged before the next command starts.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    automaton: Automaton,
    policy: FailurePolicy,
}

impl Sequencer {
    /// Create a sequencer with the default (continue-on-failure) policy.
    #[must_use]
    pub fn new(automaton: Automaton) -> Self {
        Self {
            automaton,
            policy: FailurePolicy::default(),
        }
    }

    /// Set the failure policy.
    #[must_use]
    pub const fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every step in order.
    pub async fn run(&self, steps: &[Step], secret: &Secret) -> SequenceReport {
        let cancel = CancellationToken::new();
        self.run_with_cancel(steps, secret, &cancel).await
    }

    /// Run every step in order, finalizing the in-flight session and
    /// skipping the rest if `cancel` is raised.
    pub async fn run_with_cancel(
        &self,
        steps: &[Step],
        secret: &Secret,
        cancel: &CancellationToken,
    ) -> SequenceReport {
        let mut reports = Vec::with_capacity(steps.len());
        let mut aborted = false;

        for step in steps {
            info!(step = %step.label, "running step");
            let outcome = self
                .automaton
                .run_with_cancel(&step.command, &step.expectations, secret, cancel)
                .await;

            let completed = outcome.is_completed();
            if completed {
                info!(step = %step.label, status = %outcome.status, "step finished");
            } else {
                warn!(
                    step = %step.label,
                    status = %outcome.status,
                    summary = %outcome.summary(Some(secret)),
                    "step did not complete"
                );
            }

            reports.push(StepReport {
                label: step.label.clone(),
                outcome,
            });

            if cancel.is_cancelled()
                || (!completed && self.policy == FailurePolicy::FailFast)
            {
                aborted = true;
                break;
            }
        }

        SequenceReport {
            steps: reports,
            aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::Reaction;

    fn echo_step(label: &str) -> Step {
        Step::new(
            label,
            format!("echo {label}"),
            ExpectSet::new().on("Password:", Reaction::SendSecret),
        )
    }

    #[tokio::test]
    async fn runs_all_steps_in_order() {
        let sequencer = Sequencer::new(Automaton::new());
        let steps = vec![echo_step("first"), echo_step("second")];
        let report = sequencer.run(&steps, &Secret::new("x")).await;

        assert_eq!(report.steps.len(), 2);
        assert!(!report.aborted);
        assert!(report.all_completed());
        assert_eq!(report.steps[0].label, "first");
        assert!(report.get("second").is_some());
    }

    #[tokio::test]
    async fn empty_sequence_reports_nothing() {
        let sequencer = Sequencer::new(Automaton::new());
        let report = sequencer.run(&[], &Secret::new("x")).await;
        assert!(report.steps.is_empty());
        assert!(report.all_completed());
        assert!(!report.aborted);
    }
}
