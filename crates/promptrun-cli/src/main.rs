//! promptrun binary entry point.
//!
//! Human-readable result lines go to stdout; structured logs go to stderr
//! (level via `RUST_LOG`).

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use promptrun::{
    Automaton, AutomatonConfig, ExpectSet, FailurePolicy, Outcome, Secret, SequenceReport,
    Sequencer,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli;
mod plan;

use cli::{Cli, Command};
use plan::Plan;

/// Markers used by `exec` when none are given: the wordings the privileged
/// commands this tool grew up on actually print.
const DEFAULT_PROMPTS: &[&str] = &["Password:", "senha:"];

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("promptrun=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A token that cancels the in-flight session on Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handler = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handler.cancel();
        }
    });
    cancel
}

/// Resolve the secret from `--secret-file` or the configured environment
/// variable. `None` when neither is set.
fn load_secret(cli: &Cli) -> anyhow::Result<Option<Secret>> {
    if let Some(ref path) = cli.secret_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading secret file {}", path.display()))?;
        return Ok(Some(Secret::new(raw.trim_end_matches(['\r', '\n']))));
    }

    match std::env::var(&cli.secret_env) {
        Ok(value) => Ok(Some(Secret::new(value))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading ${}", cli.secret_env)),
    }
}

/// Clone an outcome with the secret scrubbed from its textual fields.
fn redacted(outcome: &Outcome, secret: &Secret) -> Outcome {
    let mut outcome = outcome.clone();
    outcome.output = secret.redact(&outcome.output);
    outcome.detail = outcome.detail.map(|d| secret.redact(&d));
    outcome
}

fn print_report(report: &SequenceReport, secret: &Secret, json: bool) -> anyhow::Result<()> {
    if json {
        let scrubbed: Vec<_> = report
            .steps
            .iter()
            .map(|s| {
                serde_json::json!({
                    "label": s.label,
                    "outcome": redacted(&s.outcome, secret),
                })
            })
            .collect();
        let doc = serde_json::json!({ "steps": scrubbed, "aborted": report.aborted });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for step in &report.steps {
        println!("==> {}", step.label);
        println!("{}", step.outcome.summary(Some(secret)));
        println!();
    }
    if report.aborted {
        println!("sequence aborted after {} step(s)", report.steps.len());
    }
    Ok(())
}

async fn run_plan(cli: &Cli, plan_path: &std::path::Path, fail_fast: bool) -> anyhow::Result<bool> {
    let plan = Plan::load(plan_path)?;
    tracing::info!(
        plan = %plan_path.display(),
        steps = plan.steps.len(),
        "loaded provisioning plan"
    );

    let secret = match load_secret(cli)? {
        Some(secret) => secret,
        None if plan.needs_secret() => anyhow::bail!(
            "no secret available: set ${} or pass --secret-file",
            cli.secret_env
        ),
        None => Secret::new(""),
    };

    let automaton = Automaton::with_config(plan.automaton_config());
    let policy = if fail_fast {
        FailurePolicy::FailFast
    } else {
        FailurePolicy::Continue
    };
    let sequencer = Sequencer::new(automaton).policy(policy);

    let cancel = ctrl_c_token();
    let report = sequencer
        .run_with_cancel(&plan.steps(), &secret, &cancel)
        .await;
    print_report(&report, &secret, cli.json)?;

    Ok(!fail_fast || (!report.aborted && report.all_completed()))
}

async fn run_exec(
    cli: &Cli,
    command: &str,
    prompts: &[String],
    timeout_secs: Option<u64>,
    require_match: bool,
    fail_fast: bool,
) -> anyhow::Result<bool> {
    let prompts: Vec<String> = if prompts.is_empty() {
        DEFAULT_PROMPTS.iter().map(ToString::to_string).collect()
    } else {
        prompts.to_vec()
    };

    let secret = load_secret(cli)?.ok_or_else(|| {
        anyhow::anyhow!(
            "no secret available: set ${} or pass --secret-file",
            cli.secret_env
        )
    })?;

    let mut config = AutomatonConfig::new().require_match(require_match);
    if let Some(secs) = timeout_secs {
        config = config.timeout(std::time::Duration::from_secs(secs));
    }
    let automaton = Automaton::with_config(config);
    let expectations = ExpectSet::secret_prompts(prompts);

    let cancel = ctrl_c_token();
    let outcome = automaton
        .run_with_cancel(command, &expectations, &secret, &cancel)
        .await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&redacted(&outcome, &secret))?
        );
    } else {
        println!("{}", outcome.summary(Some(&secret)));
    }

    Ok(!fail_fast || outcome.is_completed())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let ok = match cli.command {
        Command::Run { ref plan, fail_fast } => run_plan(&cli, plan, fail_fast).await?,
        Command::Exec {
            ref command,
            ref prompts,
            timeout_secs,
            require_match,
            fail_fast,
        } => {
            run_exec(
                &cli,
                command,
                prompts,
                timeout_secs,
                require_match,
                fail_fast,
            )
            .await?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
