//! A provisioning sequence in the classic shape: write a reverse-proxy
//! config, enable it, reload the server, request a certificate. Each step
//! runs as the configured user via `su -c`, with the password answered
//! automatically when prompted.
//!
//! ```sh
//! PROMPTRUN_SECRET=... cargo run --example provision
//! ```

use promptrun::{Automaton, ExpectSet, FailurePolicy, Secret, Sequencer, Step};

const SITE: &str = "app.example.org";

fn step(label: &str, command: String) -> Step {
    Step::new(
        label,
        command,
        ExpectSet::secret_prompts(["Password:", "senha:"]),
    )
}

#[tokio::main]
async fn main() {
    let Ok(password) = std::env::var("PROMPTRUN_SECRET") else {
        eprintln!("set PROMPTRUN_SECRET first");
        std::process::exit(2);
    };
    let secret = Secret::new(password);

    let steps = vec![
        step(
            "write nginx config",
            format!(
                "su -c 'printf \"server {{ listen 80; server_name {SITE}; }}\" \
                 > /etc/nginx/sites-available/{SITE}.conf'"
            ),
        ),
        step(
            "enable site",
            format!(
                "su -c 'ln -sf /etc/nginx/sites-available/{SITE}.conf /etc/nginx/sites-enabled/'"
            ),
        ),
        step(
            "test and reload nginx",
            "su -c 'nginx -t && systemctl reload nginx'".to_string(),
        ),
        step(
            "issue certificate",
            format!("su -c 'certbot --nginx -d {SITE} --non-interactive --agree-tos'"),
        ),
    ];

    let sequencer = Sequencer::new(Automaton::new()).policy(FailurePolicy::Continue);
    let report = sequencer.run(&steps, &secret).await;

    for step in &report.steps {
        println!("==> {}", step.label);
        println!("{}\n", step.outcome.summary(Some(&secret)));
    }
}
