use crate::domain::model::{Address, TxHash, TxReceipt, TxRequest};
use crate::utils::error::Result;
use alloy::json_abi::JsonAbi;
use async_trait::async_trait;

/// The subset of an Ethereum node the sequencer needs.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `net_version`, the identifier Truffle-style profiles pin against.
    async fn network_id(&self) -> Result<u64>;

    /// Accounts the node can sign for.
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Submits a transaction and returns its hash.
    async fn send_transaction(&self, tx: &TxRequest) -> Result<TxHash>;

    /// Blocks until the transaction is mined or the client gives up.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt>;
}

/// Compiled contract output.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    pub bytecode: Vec<u8>,
    pub abi: Option<JsonAbi>,
}

pub trait ArtifactStore: Send + Sync {
    fn load(&self, contract: &str) -> Result<Artifact>;
}
