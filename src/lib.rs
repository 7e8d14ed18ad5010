//! Deploys a compiled contract and reports its address.
pub mod artifacts;
pub mod config;
pub mod constants;
pub mod deployer;
pub mod orchestrator;
pub mod provider;

mod formatting;
mod wallet;

use std::io;

pub use config::Config;
pub use deployer::RpcProvider;
pub use orchestrator::{Orchestrator, Outcome};
pub use provider::{ContractFactory, Deployment, DeploymentProvider};

/// Main entrypoint to `metachess-deploy`.
///
/// Deploys the configured contract once and prints where it landed to stdout.
pub async fn run(config: Config) -> Outcome {
    let provider = RpcProvider::new(config.deploy.clone());
    let orchestrator = Orchestrator::new(config.deploy, provider);
    orchestrator.execute(&mut io::stdout()).await
}
