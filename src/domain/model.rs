use crate::utils::error::{DeployError, Result};
pub use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parses a `0x`-prefixed, 40 digit hex address. Mixed-case input must carry
/// a valid EIP-55 checksum; all-lower or all-upper input is accepted as is.
pub fn parse_address(value: &str) -> Result<Address> {
    let invalid = |reason: String| DeployError::InvalidAddress {
        value: value.to_string(),
        reason,
    };

    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix".to_string()))?;
    if digits.len() != 40 {
        return Err(invalid(format!(
            "expected 40 hex digits, found {}",
            digits.len()
        )));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters".to_string()));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(value, None)
            .map_err(|_| invalid("EIP-55 checksum mismatch".to_string()));
    }
    Address::from_str(value).map_err(|e| invalid(e.to_string()))
}

/// Boundaries of the sale sub-periods, as Unix timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSchedule {
    pub funding_start_time: u64,
    pub funding_pre_end_time: u64,
    pub funding_sale1_end_time: u64,
    pub funding_sale2_end_time: u64,
    pub funding_end_time: u64,
}

impl FundingSchedule {
    pub const LABELS: [&'static str; 5] = [
        "funding_start_time",
        "funding_pre_end_time",
        "funding_sale1_end_time",
        "funding_sale2_end_time",
        "funding_end_time",
    ];

    /// Constructor order.
    pub fn as_array(&self) -> [u64; 5] {
        [
            self.funding_start_time,
            self.funding_pre_end_time,
            self.funding_sale1_end_time,
            self.funding_sale2_end_time,
            self.funding_end_time,
        ]
    }

    pub fn validate(&self) -> Result<()> {
        let times = self.as_array();
        for i in 1..times.len() {
            if times[i] <= times[i - 1] {
                return Err(DeployError::InvalidConfigValueError {
                    field: format!("schedule.{}", Self::LABELS[i]),
                    value: times[i].to_string(),
                    reason: format!(
                        "must be later than schedule.{} ({})",
                        Self::LABELS[i - 1],
                        times[i - 1]
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Transaction handed to the node for signing with an unlocked account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub to: Option<Address>,
    pub data: Vec<u8>,
    pub gas: Option<u64>,
    pub gas_price: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub contract_address: Option<Address>,
    pub succeeded: bool,
    pub gas_used: Option<u64>,
    pub block_number: Option<u64>,
}

/// What a completed step leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutput {
    pub step: String,
    pub contract: String,
    pub address: Option<Address>,
    pub tx_hash: TxHash,
    pub gas_used: Option<u64>,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    InProgress,
    Completed,
    Failed,
}

/// What the plan fed into the contracts. A record is only resumed when these
/// are unchanged, since the already deployed contracts were built from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInputs {
    pub wallet: Address,
    pub schedule: FundingSchedule,
    pub coin: String,
    pub whitelist: String,
    pub sale: String,
}

/// On-disk ledger of a deployment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub execution_id: String,
    pub plan: String,
    pub network: String,
    pub network_id: Option<u64>,
    pub sender: Address,
    pub inputs: DeploymentInputs,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub status: RecordStatus,
    pub steps: Vec<StepOutput>,
    pub failure: Option<String>,
}
