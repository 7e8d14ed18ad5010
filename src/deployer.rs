use alloy::{
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    rpc::types::eth::TransactionRequest,
    transports::Transport,
};
use async_trait::async_trait;
use eyre::{bail, eyre, Context, ContextCompat};
use owo_colors::OwoColorize;
use tracing::{debug, info};
use url::Url;

use crate::{
    artifacts,
    config::Deploy,
    constants::MAX_INIT_CODE_SIZE,
    formatting::{format_balance, format_file_size, format_gas},
    provider::{ContractFactory, Deployment, DeploymentProvider},
};

/// Deploys Hardhat artifacts over JSON-RPC.
pub struct RpcProvider {
    config: Deploy,
}

impl RpcProvider {
    pub fn new(config: Deploy) -> Self {
        Self { config }
    }

    fn rpc_url(&self) -> eyre::Result<Url> {
        Url::parse(&self.config.endpoint)
            .wrap_err_with(|| eyre!("invalid RPC endpoint {}", self.config.endpoint))
    }
}

#[async_trait]
impl DeploymentProvider for RpcProvider {
    async fn contract_factory(&self, name: &str) -> eyre::Result<ContractFactory> {
        let artifact = artifacts::load(&self.config.artifacts, name)?;
        debug!(
            contract = %artifact.fully_qualified_name(),
            artifacts = %self.config.artifacts.display(),
            "resolved artifact"
        );
        let args = self.config.args()?;
        ContractFactory::from_artifact(artifact, args)
    }

    async fn deploy(&self, factory: &ContractFactory) -> eyre::Result<Deployment> {
        let rpc_url = self.rpc_url()?;
        info!(endpoint = %self.config.endpoint.bright_magenta(), "deploying to RPC");

        match self.config.auth.wallet()? {
            Some(signer) => {
                let sender = signer.address();
                let provider = ProviderBuilder::new()
                    .with_recommended_fillers()
                    .wallet(EthereumWallet::from(signer))
                    .on_http(rpc_url);
                deploy_from(&provider, sender, factory).await
            }
            None => {
                let provider = ProviderBuilder::new()
                    .with_recommended_fillers()
                    .on_http(rpc_url);
                let sender = unlocked_account(&provider, &self.config.endpoint).await?;
                deploy_from(&provider, sender, factory).await
            }
        }
    }
}

/// The node's first account, which it signs for.
async fn unlocked_account<P, T>(provider: &P, endpoint: &str) -> eyre::Result<Address>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    let accounts = provider
        .get_accounts()
        .await
        .wrap_err_with(|| eyre!("failed to list accounts of {endpoint}"))?;
    accounts.into_iter().next().wrap_err_with(|| {
        eyre!("no private key given and the node at {endpoint} has no unlocked accounts")
    })
}

async fn deploy_from<P, T>(
    provider: &P,
    sender: Address,
    factory: &ContractFactory,
) -> eyre::Result<Deployment>
where
    P: Provider<T>,
    T: Transport + Clone,
{
    let balance = provider
        .get_balance(sender)
        .await
        .wrap_err("failed to read deployer balance")?;
    if balance.is_zero() {
        bail!("not enough funds in account {sender} to pay for deployment");
    }
    debug!(sender = %sender, balance = %format_balance(balance), "deployer account");

    let init_code = factory.init_code();
    info!(
        contract = %factory.name,
        size = %format_file_size(init_code.len(), MAX_INIT_CODE_SIZE / 2, MAX_INIT_CODE_SIZE),
        "init code size"
    );

    let tx = TransactionRequest::default()
        .with_from(sender)
        .into_create()
        .with_input(init_code);
    let pending = provider
        .send_transaction(tx)
        .await
        .wrap_err("failed to send deployment transaction")?;
    let tx_hash = *pending.tx_hash();
    info!(tx_hash = %tx_hash.bright_magenta(), "waiting for deployment to be mined");

    let receipt = pending
        .get_receipt()
        .await
        .wrap_err_with(|| eyre!("failed to get receipt of deployment tx {tx_hash}"))?;
    if !receipt.status() {
        bail!("deployment tx {tx_hash} reverted");
    }
    let address = receipt
        .contract_address()
        .wrap_err("failed to read contract address from tx receipt")?;

    let gas_used = receipt.gas_used;
    info!(
        address = %address.bright_purple(),
        gas = %format_gas(gas_used),
        "deployed code"
    );

    Ok(Deployment {
        address,
        transaction_hash: tx_hash,
        deployer: sender,
        gas_used,
    })
}
