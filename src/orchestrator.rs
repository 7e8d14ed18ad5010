use std::io::Write;

use eyre::{eyre, Context};
use tokio::time;
use tracing::info;

use crate::{
    config::Deploy,
    provider::{Deployment, DeploymentProvider},
};

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    Succeeded(Deployment),
    Failed(eyre::Report),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Succeeded(_) => 0,
            Outcome::Failed(_) => 1,
        }
    }
}

/// Looks up a contract, deploys it once and reports where it went.
pub struct Orchestrator<P> {
    config: Deploy,
    provider: P,
}

impl<P: DeploymentProvider> Orchestrator<P> {
    pub fn new(config: Deploy, provider: P) -> Self {
        Self { config, provider }
    }

    pub async fn execute<W: Write>(&self, out: &mut W) -> Outcome {
        match self.run(out).await {
            Ok(deployment) => Outcome::Succeeded(deployment),
            Err(e) => Outcome::Failed(e),
        }
    }

    /// Deploys the configured contract and writes the success line to `out`.
    ///
    /// Nothing is written unless the deployment went through.
    pub async fn run<W: Write>(&self, out: &mut W) -> eyre::Result<Deployment> {
        let name = &self.config.contract;
        info!(contract = %name, "resolving contract factory");
        let factory = self
            .provider
            .contract_factory(name)
            .await
            .wrap_err_with(|| eyre!("failed to get contract factory for {name}"))?;

        let deployment = match self.config.timeout() {
            Some(limit) => time::timeout(limit, factory.deploy(&self.provider))
                .await
                .map_err(|_| eyre!("deployment of {name} timed out after {limit:?}"))?,
            None => factory.deploy(&self.provider).await,
        }
        .wrap_err_with(|| eyre!("failed to deploy {name}"))?;

        report(out, name, &deployment)?;
        Ok(deployment)
    }
}

/// Writes `<contract> deployed to: <address>`, naming the contract the way a
/// deploy script would name its instance variable.
pub fn report<W: Write>(out: &mut W, contract: &str, deployment: &Deployment) -> eyre::Result<()> {
    writeln!(out, "{} deployed to: {}", instance_name(contract), deployment.address)?;
    out.flush()?;
    Ok(())
}

/// `contracts/MetaChess.sol:MetaChess` -> `metaChess`.
fn instance_name(contract: &str) -> String {
    let bare = contract.rsplit_once(':').map_or(contract, |(_, name)| name);
    let mut chars = bare.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::{Arc, Mutex},
        time::Duration,
    };

    use alloy::primitives::{address, b256, Address, Bytes};
    use eyre::eyre;
    use mockall::predicate::eq;

    use super::{instance_name, Orchestrator, Outcome};
    use crate::{
        config::{Deploy, PrivateKey},
        provider::{ContractFactory, Deployment, MockDeploymentProvider},
    };

    const ADDRESS: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    fn config() -> Deploy {
        Deploy {
            contract: "MetaChess".to_owned(),
            artifacts: "artifacts".into(),
            endpoint: "http://localhost:8545".to_owned(),
            args: vec![],
            timeout: None,
            auth: PrivateKey::default(),
        }
    }

    fn factory() -> ContractFactory {
        ContractFactory {
            name: "MetaChess".to_owned(),
            source_name: "contracts/MetaChess.sol".to_owned(),
            bytecode: Bytes::from_static(&[0x60, 0x80]),
            args: Bytes::new(),
        }
    }

    fn deployment() -> Deployment {
        Deployment {
            address: ADDRESS,
            transaction_hash: b256!(
                "00000000000000000000000000000000000000000000000000000000000000aa"
            ),
            deployer: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            gas_used: 1_000_000,
        }
    }

    /// A writer whose contents the mock can inspect mid-run.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn reports_deployed_address() {
        let mut provider = MockDeploymentProvider::new();
        provider
            .expect_contract_factory()
            .with(eq("MetaChess"))
            .times(1)
            .returning(|_| Ok(factory()));
        provider
            .expect_deploy()
            .with(eq(factory()))
            .times(1)
            .returning(|_| Ok(deployment()));

        let orchestrator = Orchestrator::new(config(), provider);
        let mut out = Vec::new();
        let outcome = orchestrator.execute(&mut out).await;

        assert_eq!(outcome.exit_code(), 0);
        assert!(matches!(outcome, Outcome::Succeeded(ref d) if d.address == ADDRESS));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "metaChess deployed to: 0x5FbDB2315678afecb367f032d93F642f64180aa3\n"
        );
    }

    #[tokio::test]
    async fn lookup_failure_skips_deploy() {
        let mut provider = MockDeploymentProvider::new();
        provider
            .expect_contract_factory()
            .times(1)
            .returning(|_| Err(eyre!("HH700: artifact not found")));
        provider.expect_deploy().never();

        let orchestrator = Orchestrator::new(config(), provider);
        let mut out = Vec::new();
        let outcome = orchestrator.execute(&mut out).await;

        assert_eq!(outcome.exit_code(), 1);
        let Outcome::Failed(err) = outcome else {
            panic!("lookup failure should fail the run");
        };
        assert!(format!("{err:?}").contains("HH700: artifact not found"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn deploy_failure_is_reported() {
        let mut provider = MockDeploymentProvider::new();
        provider
            .expect_contract_factory()
            .times(1)
            .returning(|_| Ok(factory()));
        provider
            .expect_deploy()
            .times(1)
            .returning(|_| Err(eyre!("insufficient funds for gas * price + value")));

        let orchestrator = Orchestrator::new(config(), provider);
        let mut out = Vec::new();
        let outcome = orchestrator.execute(&mut out).await;

        assert_eq!(outcome.exit_code(), 1);
        let Outcome::Failed(err) = outcome else {
            panic!("deploy failure should fail the run");
        };
        assert_eq!(
            err.root_cause().to_string(),
            "insufficient funds for gas * price + value"
        );
        assert!(format!("{err:?}").contains("insufficient funds"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn each_run_deploys_again() {
        let mut provider = MockDeploymentProvider::new();
        provider
            .expect_contract_factory()
            .times(2)
            .returning(|_| Ok(factory()));
        provider
            .expect_deploy()
            .times(2)
            .returning(|_| Ok(deployment()));

        let orchestrator = Orchestrator::new(config(), provider);
        let mut out = Vec::new();
        orchestrator.run(&mut out).await.unwrap();
        orchestrator.run(&mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[tokio::test]
    async fn nothing_printed_before_deploy_resolves() {
        let out = SharedBuffer::default();
        let observed = out.clone();

        let mut provider = MockDeploymentProvider::new();
        provider
            .expect_contract_factory()
            .returning(|_| Ok(factory()));
        provider.expect_deploy().times(1).returning(move |_| {
            assert!(observed.contents().is_empty());
            Ok(deployment())
        });

        let orchestrator = Orchestrator::new(config(), provider);
        let mut writer = out.clone();
        orchestrator.run(&mut writer).await.unwrap();

        assert!(out.contents().starts_with("metaChess deployed to: "));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_deploy_times_out() {
        struct Stalled;

        #[async_trait::async_trait]
        impl crate::provider::DeploymentProvider for Stalled {
            async fn contract_factory(&self, _: &str) -> eyre::Result<ContractFactory> {
                Ok(factory())
            }

            async fn deploy(&self, _: &ContractFactory) -> eyre::Result<Deployment> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(deployment())
            }
        }

        let mut config = config();
        config.timeout = Some(5);
        let orchestrator = Orchestrator::new(config, Stalled);
        let mut out = Vec::new();
        let outcome = orchestrator.execute(&mut out).await;

        assert_eq!(outcome.exit_code(), 1);
        let Outcome::Failed(err) = outcome else {
            panic!("stalled deploy should time out");
        };
        assert!(err.to_string().contains("timed out"));
        assert!(out.is_empty());
    }

    #[test]
    fn names_instance_after_contract() {
        assert_eq!(instance_name("MetaChess"), "metaChess");
        assert_eq!(instance_name("contracts/MetaChess.sol:MetaChess"), "metaChess");
        assert_eq!(instance_name(""), "");
    }
}
