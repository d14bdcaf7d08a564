//! Blocking wrapper for script-like callers.
//!
//! The automaton is async-first, but the callers it replaces are plain
//! sequential scripts. This wrapper owns a current-thread runtime and
//! exposes blocking equivalents of the async entry points.

use tokio::runtime::{Builder, Runtime};

use crate::automaton::Automaton;
use crate::config::AutomatonConfig;
use crate::error::{Result, RunError};
use crate::expect::ExpectSet;
use crate::outcome::Outcome;
use crate::secret::Secret;
use crate::sequence::{FailurePolicy, SequenceReport, Sequencer, Step};

/// A blocking automaton.
pub struct BlockingAutomaton {
    runtime: Runtime,
    inner: Automaton,
}

impl BlockingAutomaton {
    /// Create a blocking automaton with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(AutomatonConfig::default())
    }

    /// Create a blocking automaton with a custom configuration.
    pub fn with_config(config: AutomatonConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RunError::io("creating tokio runtime", e))?;

        Ok(Self {
            runtime,
            inner: Automaton::with_config(config),
        })
    }

    /// Blocking equivalent of [`Automaton::run`].
    pub fn run(&self, command: &str, expectations: &ExpectSet, secret: &Secret) -> Outcome {
        self.runtime
            .block_on(self.inner.run(command, expectations, secret))
    }

    /// Run a sequence of steps under the given failure policy.
    pub fn run_sequence(
        &self,
        steps: &[Step],
        secret: &Secret,
        policy: FailurePolicy,
    ) -> SequenceReport {
        let sequencer = Sequencer::new(self.inner.clone()).policy(policy);
        self.runtime.block_on(sequencer.run(steps, secret))
    }
}

impl std::fmt::Debug for BlockingAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingAutomaton")
            .field("config", self.inner.config())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_run_completes() {
        let automaton = BlockingAutomaton::new().expect("runtime");
        let set = ExpectSet::secret_prompts(["Password:"]);
        let outcome = automaton.run("echo plain", &set, &Secret::new("x"));

        assert!(outcome.is_completed());
        assert!(outcome.output.contains("plain"));
        assert_eq!(outcome.responses, 0);
    }
}
