//! Run a single command and print its outcome.
//!
//! ```sh
//! cargo run --example basic
//! ```

use promptrun::{Automaton, ExpectSet, Secret};

#[tokio::main]
async fn main() {
    let automaton = Automaton::new();
    let prompts = ExpectSet::secret_prompts(["Password:", "senha:"]);
    let secret = Secret::new(std::env::var("PROMPTRUN_SECRET").unwrap_or_default());

    let outcome = automaton
        .run("printf 'Password:'; read p; echo accepted", &prompts, &secret)
        .await;

    println!("{}", outcome.summary(Some(&secret)));
}
