//! End-to-end scenarios against real `/bin/sh` children.

use std::time::{Duration, Instant};

use promptrun::{
    Automaton, AutomatonConfig, ExpectSet, OutcomeStatus, Reaction, Secret, TimeoutScope,
};

fn password_prompts() -> ExpectSet {
    ExpectSet::secret_prompts(["Password:", "senha:"])
}

fn short_timeout() -> Automaton {
    Automaton::with_config(AutomatonConfig::new().timeout(Duration::from_millis(300)))
}

/// Scenario A: the command prompts, accepts input, and prints more before
/// exiting. All text on both sides of the prompt is captured.
#[tokio::test]
async fn prompt_answered_and_output_spans_the_prompt() {
    let automaton = Automaton::new();
    let secret = Secret::new("sesame");

    let outcome = automaton
        .run(
            "printf 'before-marker Password:'; read reply; echo after-marker",
            &password_prompts(),
            &secret,
        )
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.responses, 1);
    assert!(outcome.output.contains("before-marker"));
    assert!(outcome.output.contains("after-marker"));
}

/// Scenario A, locale variant: the second marker in the list fires.
#[tokio::test]
async fn locale_variant_prompt_is_recognized() {
    let automaton = Automaton::new();
    let secret = Secret::new("sesame");

    let outcome = automaton
        .run(
            "printf 'senha:'; read reply; echo liberado",
            &password_prompts(),
            &secret,
        )
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.responses, 1);
    assert!(outcome.output.contains("liberado"));
}

/// Scenario B: a non-interactive command. Completed, and the secret is
/// never written to the process.
#[tokio::test]
async fn non_interactive_command_never_receives_secret() {
    let automaton = Automaton::new();
    let secret = Secret::new("sesame-never-sent");

    let outcome = automaton
        .run("echo quiet provisioning step", &password_prompts(), &secret)
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.responses, 0);
    assert!(!outcome.output.contains("sesame-never-sent"));
    assert_eq!(outcome.exit_code, Some(0));
}

/// Scenario C: a command that hangs silently. Timed-out after the bound,
/// with the (empty) partial output still returned.
#[tokio::test]
async fn silent_hang_times_out() {
    let automaton = short_timeout();
    let secret = Secret::new("sesame");

    let started = Instant::now();
    let outcome = automaton.run("sleep 600", &password_prompts(), &secret).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome.status, OutcomeStatus::TimedOut);
    assert!(elapsed >= Duration::from_millis(300), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "unbounded overhead: {elapsed:?}");
    assert!(outcome.output.is_empty());
    assert!(outcome.detail.is_some());
}

/// Scenario C variant: output that never matches still times out, and the
/// partial output is preserved.
#[tokio::test]
async fn unmatched_output_times_out_with_partial_output() {
    let automaton = short_timeout();
    let secret = Secret::new("sesame");

    let outcome = automaton
        .run("echo chatter; sleep 600", &password_prompts(), &secret)
        .await;

    assert_eq!(outcome.status, OutcomeStatus::TimedOut);
    assert!(outcome.output.contains("chatter"));
}

/// Scenario D: spawn failure. Process-error with empty output; nothing to
/// drain, nothing leaked.
#[tokio::test]
async fn spawn_failure_is_a_process_error() {
    let config = AutomatonConfig::new().shell("/nonexistent/shell");
    let automaton = Automaton::with_config(config);
    let secret = Secret::new("sesame");

    let outcome = automaton.run("echo unreachable", &password_prompts(), &secret).await;

    assert_eq!(outcome.status, OutcomeStatus::ProcessError);
    assert!(outcome.output.is_empty());
    assert!(outcome.detail.unwrap().contains("spawn"));
}

/// Repeated prompts are each answered; the general contract is not limited
/// to a single injection.
#[tokio::test]
async fn repeated_prompts_are_each_answered() {
    let automaton = Automaton::new();
    let secret = Secret::new("sesame");

    let outcome = automaton
        .run(
            "printf 'Password:'; read a; printf 'Password:'; read b; echo twice-done",
            &password_prompts(),
            &secret,
        )
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.responses, 2);
    assert!(outcome.output.contains("twice-done"));
}

/// A cumulative bound cuts off a session even when output keeps flowing.
#[tokio::test]
async fn cumulative_timeout_bounds_the_whole_session() {
    let config = AutomatonConfig::new()
        .timeout(Duration::from_millis(500))
        .timeout_scope(TimeoutScope::Cumulative);
    let automaton = Automaton::with_config(config);
    let secret = Secret::new("sesame");

    let started = Instant::now();
    let outcome = automaton
        .run(
            "while true; do echo tick; sleep 0.1; done",
            &password_prompts(),
            &secret,
        )
        .await;

    assert_eq!(outcome.status, OutcomeStatus::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(outcome.output.contains("tick"));
}

/// Stop reactions finalize as completed without injecting anything.
#[tokio::test]
async fn stop_marker_finalizes_without_injection() {
    let automaton = Automaton::new();
    let secret = Secret::new("sesame");
    let set = ExpectSet::new()
        .on("Password:", Reaction::SendSecret)
        .on("station ready", Reaction::Stop);

    let outcome = automaton
        .run("echo station ready; sleep 600", &set, &secret)
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.responses, 0);
    assert!(outcome.output.contains("station ready"));
}

/// The summary never leaks the secret even though the PTY echoes input.
#[tokio::test]
async fn summary_scrubs_echoed_secret() {
    let automaton = Automaton::new();
    let secret = Secret::new("hunter2-very-secret");

    let outcome = automaton
        .run(
            "printf 'Password:'; read reply; echo \"you typed: $reply\"",
            &password_prompts(),
            &secret,
        )
        .await;

    assert_eq!(outcome.status, OutcomeStatus::Completed);
    let summary = outcome.summary(Some(&secret));
    assert!(!summary.contains("hunter2-very-secret"), "summary leaked: {summary}");
}
