//! Provisioning plan files.
//!
//! A plan is a TOML file describing a fixed sequence of commands plus the
//! prompt markers shared by the sequence:
//!
//! ```toml
//! [automaton]
//! timeout-secs = 30
//! prompts = ["Password:", "senha:"]
//!
//! [[step]]
//! label = "test and reload nginx"
//! command = "su -c 'nginx -t && systemctl reload nginx'"
//!
//! [[step]]
//! label = "issue certificate"
//! command = "su -c 'certbot --nginx -d example.org --non-interactive --agree-tos'"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use promptrun::{AutomatonConfig, ExpectSet, Step};
use serde::Deserialize;

/// A parsed plan file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Plan {
    /// Automaton settings shared by every step.
    #[serde(default)]
    pub automaton: AutomatonSection,

    /// Steps, executed in file order.
    #[serde(rename = "step", default)]
    pub steps: Vec<StepSection>,
}

/// The `[automaton]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AutomatonSection {
    /// Wait bound in seconds.
    pub timeout_secs: Option<u64>,

    /// Shell used to interpret commands.
    pub shell: Option<String>,

    /// Prompt markers answered with the secret, in precedence order.
    #[serde(default)]
    pub prompts: Vec<String>,

    /// Treat end-of-stream without a recognized prompt as a failure.
    #[serde(default)]
    pub require_match: bool,
}

/// One `[[step]]` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StepSection {
    /// Label used in logs and reports. Defaults to the command itself.
    pub label: Option<String>,

    /// The command to run.
    pub command: String,

    /// Per-step prompt override; falls back to the shared prompts.
    pub prompts: Option<Vec<String>>,
}

impl Plan {
    /// Load and parse a plan file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading plan file {}", path.display()))?;
        let plan: Self = toml::from_str(&text)
            .with_context(|| format!("parsing plan file {}", path.display()))?;

        anyhow::ensure!(!plan.steps.is_empty(), "plan has no steps");
        for step in &plan.steps {
            let prompts = step.prompts.as_ref().unwrap_or(&plan.automaton.prompts);
            anyhow::ensure!(
                !prompts.is_empty(),
                "step {:?} has no prompt markers (set [automaton] prompts or the step's own)",
                step.label.as_deref().unwrap_or(&step.command),
            );
        }
        Ok(plan)
    }

    /// Automaton configuration described by the plan.
    #[must_use]
    pub fn automaton_config(&self) -> AutomatonConfig {
        let mut config = AutomatonConfig::new().require_match(self.automaton.require_match);
        if let Some(secs) = self.automaton.timeout_secs {
            config = config.timeout(Duration::from_secs(secs));
        }
        if let Some(ref shell) = self.automaton.shell {
            config = config.shell(shell.clone());
        }
        config
    }

    /// Materialize the steps.
    #[must_use]
    pub fn steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .map(|step| {
                let prompts = step.prompts.as_ref().unwrap_or(&self.automaton.prompts);
                let label = step.label.clone().unwrap_or_else(|| step.command.clone());
                Step::new(
                    label,
                    step.command.clone(),
                    ExpectSet::secret_prompts(prompts.iter().cloned()),
                )
            })
            .collect()
    }

    /// Whether any step will answer prompts (and therefore needs a secret).
    #[must_use]
    pub fn needs_secret(&self) -> bool {
        self.steps
            .iter()
            .any(|s| !s.prompts.as_ref().unwrap_or(&self.automaton.prompts).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
        [automaton]
        timeout-secs = 10
        prompts = ["Password:", "senha:"]

        [[step]]
        label = "write config"
        command = "su -c 'echo conf > /etc/nginx/sites-available/site.conf'"

        [[step]]
        command = "su -c 'systemctl reload nginx'"
    "#;

    #[test]
    fn parses_a_plan() {
        let plan: Plan = toml::from_str(PLAN).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.automaton.timeout_secs, Some(10));

        let steps = plan.steps();
        assert_eq!(steps[0].label, "write config");
        // Unlabeled steps fall back to the command text.
        assert!(steps[1].label.contains("reload nginx"));
        assert_eq!(steps[0].expectations.len(), 2);
    }

    #[test]
    fn config_carries_timeout() {
        let plan: Plan = toml::from_str(PLAN).unwrap();
        let config = plan.automaton_config();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.require_match);
    }

    #[test]
    fn per_step_prompt_override() {
        let plan: Plan = toml::from_str(
            r#"
            [automaton]
            prompts = ["Password:"]

            [[step]]
            command = "true"
            prompts = ["Passphrase:"]
        "#,
        )
        .unwrap();

        let steps = plan.steps();
        assert_eq!(steps[0].expectations.len(), 1);
        assert!(plan.needs_secret());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<Plan, _> = toml::from_str(
            r#"
            [automaton]
            retries = 3
        "#,
        );
        assert!(result.is_err());
    }
}
