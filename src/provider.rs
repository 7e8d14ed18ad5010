use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use eyre::bail;

use crate::artifacts::Artifact;

/// Resolves contract factories and puts them onchain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeploymentProvider: Send + Sync {
    /// Looks up the contract called `name`, ready to deploy.
    async fn contract_factory(&self, name: &str) -> eyre::Result<ContractFactory>;

    /// Sends the creation transaction for `factory` and waits for it to be
    /// mined.
    async fn deploy(&self, factory: &ContractFactory) -> eyre::Result<Deployment>;
}

/// A contract that has been compiled but not deployed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFactory {
    pub name: String,
    pub source_name: String,
    pub bytecode: Bytes,
    /// ABI-encoded constructor arguments, appended to `bytecode`.
    pub args: Bytes,
}

impl ContractFactory {
    pub fn from_artifact(artifact: Artifact, args: Vec<u8>) -> eyre::Result<Self> {
        let bytecode = artifact.creation_code()?;
        let inputs = artifact.constructor_inputs();
        let name = artifact.fully_qualified_name();
        if inputs > 0 && args.is_empty() {
            bail!("the constructor of {name} expects {inputs} arguments, but none were given");
        }
        if inputs == 0 && !args.is_empty() {
            bail!("the constructor of {name} takes no arguments, but some were given");
        }

        Ok(Self {
            name: artifact.contract_name,
            source_name: artifact.source_name,
            bytecode: bytecode.into(),
            args: args.into(),
        })
    }

    /// Creation transaction input.
    pub fn init_code(&self) -> Bytes {
        [&self.bytecode[..], &self.args[..]].concat().into()
    }

    pub async fn deploy<P>(&self, provider: &P) -> eyre::Result<Deployment>
    where
        P: DeploymentProvider + ?Sized,
    {
        provider.deploy(self).await
    }
}

/// A deployed contract instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub deployer: Address,
    pub gas_used: u128,
}
