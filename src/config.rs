use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser};
use eyre::Context;
use tracing::level_filters::LevelFilter;

use crate::constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_CONTRACT, DEFAULT_ENDPOINT};

/// Command-line configuration for `metachess-deploy`.
///
/// Every flag has a default, so running the binary without arguments deploys
/// `MetaChess` from `./artifacts` to a local node.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The verbosity level of diagnostic logs, written to stderr.
    #[arg(short, long, env = "DEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,
    #[command(flatten)]
    pub deploy: Deploy,
}

/// Deploy a contract from its compiled artifact.
#[derive(Args, Debug, Clone)]
pub struct Deploy {
    /// Name of the contract to deploy, bare (`MetaChess`) or fully qualified
    /// (`contracts/MetaChess.sol:MetaChess`).
    #[arg(long, env = "DEPLOY_CONTRACT", default_value = DEFAULT_CONTRACT)]
    pub contract: String,
    /// Directory holding the compiled contract artifacts.
    #[arg(long, env = "DEPLOY_ARTIFACTS", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,
    /// JSON-RPC endpoint of the target network.
    #[arg(short, long, env = "DEPLOY_RPC_URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    /// ABI-encoded constructor arguments, as hex strings.
    #[arg(long)]
    pub args: Vec<String>,
    /// Give up waiting for the deployment after this many seconds.
    #[arg(long, env = "DEPLOY_TIMEOUT")]
    pub timeout: Option<u64>,
    #[command(flatten)]
    pub auth: PrivateKey,
}

impl Deploy {
    /// Concatenated constructor arguments.
    pub fn args(&self) -> eyre::Result<Vec<u8>> {
        Ok(self
            .args
            .iter()
            .map(|arg| hex::decode(arg.trim_start_matches("0x")))
            .collect::<Result<Vec<_>, _>>()
            .wrap_err("args were not proper hex strings")?
            .concat())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Where to get the deployer's key from. When none of these is set, the
/// node's first unlocked account is used instead.
#[derive(Args, Debug, Clone, Default)]
pub struct PrivateKey {
    /// File path to a text file containing a hex-encoded private key.
    #[arg(long)]
    pub private_key_path: Option<PathBuf>,
    /// Private key as a hex string. Warning: this exposes your key to shell
    /// history.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
    /// Path to an Ethereum wallet keystore file (e.g. clef).
    #[arg(long)]
    pub keystore_path: Option<PathBuf>,
    /// Keystore password file.
    #[arg(long)]
    pub keystore_password_path: Option<PathBuf>,
}
