use crate::core::abi;
use crate::core::sequencer::{DeploymentContext, DeploymentStep};
use crate::domain::model::{Address, StepOutput, TxReceipt};
use crate::domain::ports::{ArtifactStore, ChainClient};
use crate::utils::error::{DeployError, Result};
use alloy::dyn_abi::DynSolValue;
use alloy::primitives::U256;
use std::sync::Arc;

/// A constructor or call argument, resolved when the step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Address(Address),
    Uint(U256),
    /// Address produced by an earlier deployment of the named contract.
    AddressOf(String),
}

impl Arg {
    pub fn address(address: Address) -> Self {
        Arg::Address(address)
    }

    pub fn uint(value: u64) -> Self {
        Arg::Uint(U256::from(value))
    }

    pub fn address_of(contract: &str) -> Self {
        Arg::AddressOf(contract.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Address(_) | Arg::AddressOf(_) => "address",
            Arg::Uint(_) => "uint256",
        }
    }

    fn resolve(&self, context: &DeploymentContext) -> Result<DynSolValue> {
        match self {
            Arg::Address(address) => Ok(DynSolValue::Address(*address)),
            Arg::Uint(value) => Ok(DynSolValue::Uint(*value, 256)),
            Arg::AddressOf(contract) => context.require_address(contract).map(DynSolValue::Address),
        }
    }

    fn describe(&self) -> String {
        match self {
            Arg::Address(address) => address.to_checksum(None),
            Arg::Uint(value) => value.to_string(),
            Arg::AddressOf(contract) => format!("{}.address", contract),
        }
    }
}

fn resolve_all(args: &[Arg], context: &DeploymentContext) -> Result<Vec<DynSolValue>> {
    args.iter().map(|arg| arg.resolve(context)).collect()
}

fn describe_all(args: &[Arg]) -> String {
    args.iter().map(Arg::describe).collect::<Vec<_>>().join(", ")
}

/// Sends one transaction and waits for a successful receipt.
async fn submit(
    context: &DeploymentContext,
    chain: &dyn ChainClient,
    to: Option<Address>,
    data: Vec<u8>,
) -> Result<TxReceipt> {
    let tx = context.transaction(to, data);
    let tx_hash = chain.send_transaction(&tx).await?;
    tracing::info!("📨 Transaction sent: {}", tx_hash);

    let receipt = chain.wait_for_receipt(tx_hash).await?;
    if !receipt.succeeded {
        return Err(DeployError::TransactionReverted { tx_hash });
    }
    Ok(receipt)
}

/// Publishes a contract's bytecode with constructor arguments.
pub struct DeployContract {
    name: String,
    contract: String,
    args: Vec<Arg>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl DeployContract {
    pub fn new(contract: &str, args: Vec<Arg>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            name: format!("deploy {}", contract),
            contract: contract.to_string(),
            args,
            artifacts,
        }
    }
}

#[async_trait::async_trait]
impl DeploymentStep for DeployContract {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{}({})", self.contract, describe_all(&self.args))
    }

    fn preflight(&self) -> Result<()> {
        let artifact = self.artifacts.load(&self.contract)?;
        if let Some(arity) = artifact.constructor_arity() {
            if arity != self.args.len() {
                return Err(DeployError::ArtifactError {
                    contract: self.contract.clone(),
                    message: format!(
                        "constructor takes {} argument(s), {} supplied",
                        arity,
                        self.args.len()
                    ),
                });
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        context: &DeploymentContext,
        chain: &dyn ChainClient,
    ) -> Result<StepOutput> {
        let artifact = self.artifacts.load(&self.contract)?;
        let args = resolve_all(&self.args, context)?;
        let data = abi::encode_constructor(
            &self.contract,
            &artifact.bytecode,
            artifact.abi.as_ref(),
            &args,
        )?;
        tracing::debug!(
            "Deploying {} with {} byte payload",
            self.contract,
            data.len()
        );

        let receipt = submit(context, chain, None, data).await?;
        let address = receipt.contract_address.ok_or_else(|| DeployError::MalformedResponse {
            method: "eth_getTransactionReceipt".to_string(),
            message: format!("receipt {} has no contractAddress", receipt.tx_hash),
        })?;

        Ok(StepOutput {
            step: self.name.clone(),
            contract: self.contract.clone(),
            address: Some(address),
            tx_hash: receipt.tx_hash,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        })
    }
}

/// Calls a function on a contract deployed by an earlier step.
pub struct CallContract {
    name: String,
    target: String,
    function: String,
    args: Vec<Arg>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl CallContract {
    pub fn new(
        target: &str,
        function: &str,
        args: Vec<Arg>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            name: format!("call {}.{}", target, function),
            target: target.to_string(),
            function: function.to_string(),
            args,
            artifacts,
        }
    }

    fn input_types(&self) -> Vec<&'static str> {
        self.args.iter().map(Arg::type_name).collect()
    }
}

#[async_trait::async_trait]
impl DeploymentStep for CallContract {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!(
            "{}.{}({})",
            self.target,
            self.function,
            describe_all(&self.args)
        )
    }

    fn preflight(&self) -> Result<()> {
        let artifact = self.artifacts.load(&self.target)?;
        let types = self.input_types();
        if !artifact.has_function(&self.function, &types) {
            return Err(DeployError::ArtifactError {
                contract: self.target.clone(),
                message: format!(
                    "ABI has no function {}({})",
                    self.function,
                    types.join(",")
                ),
            });
        }
        Ok(())
    }

    async fn execute(
        &self,
        context: &DeploymentContext,
        chain: &dyn ChainClient,
    ) -> Result<StepOutput> {
        let target = context.require_address(&self.target)?;
        let artifact = self.artifacts.load(&self.target)?;
        let args = resolve_all(&self.args, context)?;
        let data = abi::encode_call(
            &self.target,
            &self.function,
            &self.input_types(),
            artifact.abi.as_ref(),
            &args,
        )?;

        let receipt = submit(context, chain, Some(target), data).await?;

        Ok(StepOutput {
            step: self.name.clone(),
            contract: self.target.clone(),
            address: None,
            tx_hash: receipt.tx_hash,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
        })
    }
}
