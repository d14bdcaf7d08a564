//! promptrun: interactive process automation.
//!
//! This crate drives commands that expect a human at a terminal. It spawns
//! a command under a pseudo-terminal, watches the output for an ordered set
//! of prompt markers, and reacts (inject a secret, stop, or fail) until the
//! process ends or the wait bound expires. The typical use is privileged
//! provisioning: running `su -c ...` commands that print a locale-dependent
//! password prompt.
//!
//! # Example
//!
//! ```ignore
//! use promptrun::{Automaton, ExpectSet, Secret};
//!
//! #[tokio::main]
//! async fn main() {
//!     let automaton = Automaton::new();
//!     let prompts = ExpectSet::secret_prompts(["Password:", "senha:"]);
//!     let secret = Secret::new(std::env::var("SU_PASSWORD").unwrap());
//!
//!     for command in [
//!         "su -c 'nginx -t && systemctl reload nginx'",
//!     ] {
//!         let outcome = automaton.run(command, &prompts, &secret).await;
//!         println!("{}", outcome.summary(Some(&secret)));
//!     }
//! }
//! ```
//!
//! The outcome always carries the full accumulated output, whatever the
//! status; partial output on a timeout or error path is never lost.

pub mod automaton;
pub mod config;
pub mod error;
pub mod expect;
pub mod marker;
pub mod outcome;
pub mod secret;
pub mod sequence;
pub mod session;
pub mod sync;

pub use automaton::Automaton;
pub use config::{AutomatonConfig, LineEnding, TimeoutScope};
pub use error::{Result, RunError};
pub use expect::{ExpectSet, Expectation, MatchedEntry, Reaction};
pub use marker::{CompiledRegex, Marker, MarkerMatch};
pub use outcome::{Outcome, OutcomeStatus};
pub use secret::{REDACTED, Secret};
pub use sequence::{FailurePolicy, SequenceReport, Sequencer, Step, StepReport};
pub use session::{ReadEvent, Session, SessionState};
pub use sync::BlockingAutomaton;
