use std::{io, process};

use clap::Parser;
use metachess_deploy::{Config, Outcome};

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Logs go to stderr; stdout only carries the deployed address.
    tracing_subscriber::fmt()
        .with_max_level(config.verbosity)
        .with_writer(io::stderr)
        .init();

    let outcome = metachess_deploy::run(config).await;
    if let Outcome::Failed(e) = &outcome {
        eprintln!("Error: {e:?}");
    }
    process::exit(outcome.exit_code());
}
