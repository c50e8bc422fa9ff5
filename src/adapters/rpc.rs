use crate::domain::model::{Address, TxHash, TxReceipt, TxRequest};
use crate::domain::ports::ChainClient;
use crate::utils::error::{DeployError, Result};
use crate::utils::retry::retry_async;
use alloy::network::{Ethereum, ReceiptResponse};
use alloy::primitives::TxKind;
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{TransactionInput, TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError as TransportRpcError, TransportError};
use std::future::Future;
use std::time::Duration;
use url::Url;

const READ_ATTEMPTS: usize = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Ethereum JSON-RPC over HTTP. Transactions are signed by the node with an
/// unlocked account.
pub struct JsonRpcClient {
    provider: RootProvider<Ethereum>,
    url: String,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let parsed = Url::parse(&url).map_err(|e| DeployError::InvalidConfigValueError {
            field: "url".to_string(),
            value: url.clone(),
            reason: format!("Invalid RPC URL: {}", e),
        })?;

        Ok(Self {
            provider: RootProvider::new_http(parsed),
            url,
            receipt_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
        })
    }

    pub fn with_receipt_polling(mut self, timeout: Duration, interval: Duration) -> Self {
        self.receipt_timeout = timeout;
        self.poll_interval = interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reads are idempotent, so calls that may not have reached the node are
    /// retried. Answers from the node, errors included, are final.
    async fn read<T, F, Fut>(&self, method: &'static str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
    {
        tracing::debug!("→ {}", method);
        retry_async(
            |_| {
                let call = op();
                async move { call.await.map_err(|e| rpc_error(method, e)) }
            },
            DeployError::is_transient,
            READ_ATTEMPTS,
            READ_RETRY_DELAY,
        )
        .await
    }

    async fn fetch_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>> {
        let receipt = self
            .read("eth_getTransactionReceipt", move || async move {
                self.provider.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.as_ref().map(convert_receipt))
    }
}

fn rpc_error(method: &str, err: TransportError) -> DeployError {
    match err {
        TransportRpcError::ErrorResp(payload) => DeployError::RpcError {
            method: method.to_string(),
            code: payload.code,
            message: payload.message.to_string(),
        },
        TransportRpcError::Transport(kind) => DeployError::TransportError {
            method: method.to_string(),
            message: kind.to_string(),
        },
        other => DeployError::MalformedResponse {
            method: method.to_string(),
            message: other.to_string(),
        },
    }
}

/// Pre-Byzantium receipts carry a state root instead of a status and count
/// as successful.
fn convert_receipt(receipt: &TransactionReceipt) -> TxReceipt {
    TxReceipt {
        tx_hash: receipt.transaction_hash(),
        contract_address: receipt.contract_address(),
        succeeded: receipt.status(),
        gas_used: Some(receipt.gas_used()),
        block_number: receipt.block_number(),
    }
}

/// A creation when `to` is unset; `gas` and `gasPrice` are left to the node
/// unless the profile pins them.
pub fn transaction_request(tx: &TxRequest) -> TransactionRequest {
    TransactionRequest {
        from: Some(tx.from),
        to: tx.to.map(TxKind::Call),
        input: TransactionInput::both(tx.data.clone().into()),
        gas: tx.gas,
        gas_price: tx.gas_price.map(u128::from),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl ChainClient for JsonRpcClient {
    async fn network_id(&self) -> Result<u64> {
        self.read("net_version", move || async move {
            self.provider.get_net_version().await
        })
        .await
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.read("eth_accounts", move || async move {
            self.provider.get_accounts().await
        })
        .await
    }

    /// Never retried: a resend after a lost response could deploy twice.
    async fn send_transaction(&self, tx: &TxRequest) -> Result<TxHash> {
        tracing::debug!("→ eth_sendTransaction");
        let pending = self
            .provider
            .send_transaction(transaction_request(tx))
            .await
            .map_err(|e| rpc_error("eth_sendTransaction", e))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt> {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(receipt) = self.fetch_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            if started.elapsed() >= self.receipt_timeout {
                return Err(DeployError::ReceiptTimeout {
                    tx_hash,
                    waited_secs: self.receipt_timeout.as_secs(),
                });
            }
            tracing::debug!("⏳ Waiting for {} to be mined", tx_hash);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
