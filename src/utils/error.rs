use alloy::primitives::TxHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Transport failure calling {method}: {message}")]
    TransportError { method: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("Artifact error for {contract}: {message}")]
    ArtifactError { contract: String, message: String },

    #[error("JSON-RPC error {code} from {method}: {message}")]
    RpcError {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Unexpected JSON-RPC response from {method}: {message}")]
    MalformedResponse { method: String, message: String },

    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: TxHash },

    #[error("No receipt for transaction {tx_hash} after {waited_secs}s")]
    ReceiptTimeout { tx_hash: TxHash, waited_secs: u64 },

    #[error("Connected to network id {actual}, profile '{network}' expects {expected}")]
    NetworkMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },

    #[error("Step '{step}' failed after {completed} completed step(s): {source}")]
    StepFailed {
        step: String,
        completed: usize,
        source: Box<DeployError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Chain,
    Artifact,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl DeployError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Failures where the request may not have reached the node.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransportError { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidAddress { .. }
            | Self::NetworkMismatch { .. } => ErrorCategory::Configuration,
            Self::TransportError { .. } | Self::ReceiptTimeout { .. } => ErrorCategory::Network,
            Self::RpcError { .. }
            | Self::MalformedResponse { .. }
            | Self::TransactionReverted { .. } => ErrorCategory::Chain,
            Self::StepFailed { source, .. } => source.category(),
            Self::ArtifactError { .. } => ErrorCategory::Artifact,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Chain => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Artifact | ErrorCategory::Io => {
                ErrorSeverity::Critical
            }
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Check the networks and plan TOML files; unresolved ${VAR} placeholders need the variable exported"
            }
            Self::InvalidAddress { .. } => {
                "Use a 0x-prefixed 40 digit hex address; mixed-case addresses must carry a valid EIP-55 checksum"
            }
            Self::NetworkMismatch { .. } => {
                "Point the profile at the right node or fix its network_id"
            }
            Self::TransportError { .. } | Self::ReceiptTimeout { .. } => {
                "Make sure the node is reachable and mining, then rerun with --resume"
            }
            Self::RpcError { .. } | Self::MalformedResponse { .. } => {
                "Check that the sender account is unlocked on the node and has enough ether"
            }
            Self::TransactionReverted { .. } => {
                "Inspect the deployment record, fix the cause, then rerun with --resume to skip completed steps"
            }
            Self::StepFailed { source, .. } => source.recovery_suggestion(),
            Self::ArtifactError { .. } => "Recompile the contracts and point --artifacts at the build output",
            Self::IoError(_) | Self::SerializationError(_) => {
                "Check file paths and permissions"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not talk to the node: {}", self),
            ErrorCategory::Chain => format!("Deployment failed on chain: {}", self),
            ErrorCategory::Artifact => format!("Contract artifact problem: {}", self),
            ErrorCategory::Io => format!("File error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_maps_to_exit_code() {
        let config = DeployError::config("plan.schedule", "not ascending");
        assert_eq!(config.category(), ErrorCategory::Configuration);
        assert_eq!(config.exit_code(), 3);

        let timeout = DeployError::ReceiptTimeout {
            tx_hash: TxHash::with_last_byte(0xab),
            waited_secs: 60,
        };
        assert_eq!(timeout.severity(), ErrorSeverity::Medium);
        assert_eq!(timeout.exit_code(), 2);

        let step = DeployError::StepFailed {
            step: "deploy PassTokenSale".to_string(),
            completed: 2,
            source: Box::new(DeployError::TransactionReverted {
                tx_hash: TxHash::with_last_byte(0xef),
            }),
        };
        assert_eq!(step.exit_code(), 1);
        assert!(step.user_friendly_message().starts_with("Deployment failed on chain"));
        assert!(step.to_string().contains("00ef reverted"));

        let timed_out = DeployError::StepFailed {
            step: "deploy PassCoin".to_string(),
            completed: 0,
            source: Box::new(timeout),
        };
        assert_eq!(timed_out.exit_code(), 2);

        let transport = DeployError::TransportError {
            method: "net_version".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(transport.category(), ErrorCategory::Network);
        assert!(transport.is_transient());
        assert!(!DeployError::RpcError {
            method: "net_version".to_string(),
            code: -32601,
            message: "method not found".to_string(),
        }
        .is_transient());
    }
}
