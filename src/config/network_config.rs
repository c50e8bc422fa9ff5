use crate::config::substitute_env_vars;
use crate::domain::model::Address;
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Smallest gas limit a transaction can carry.
const MIN_GAS: u64 = 21_000;
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworksConfig {
    pub networks: BTreeMap<String, NetworkProfile>,
}

/// `network_id = "*"` matches whatever the node reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNetworkId", into = "RawNetworkId")]
pub enum NetworkId {
    Any,
    Id(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawNetworkId {
    Id(u64),
    Text(String),
}

impl TryFrom<RawNetworkId> for NetworkId {
    type Error = String;

    fn try_from(raw: RawNetworkId) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawNetworkId::Id(id) => Ok(NetworkId::Id(id)),
            RawNetworkId::Text(text) if text.trim() == "*" => Ok(NetworkId::Any),
            RawNetworkId::Text(text) => text
                .trim()
                .parse::<u64>()
                .map(NetworkId::Id)
                .map_err(|_| format!("network_id must be \"*\" or an integer, got {:?}", text)),
        }
    }
}

impl From<NetworkId> for RawNetworkId {
    fn from(id: NetworkId) -> Self {
        match id {
            NetworkId::Any => RawNetworkId::Text("*".to_string()),
            NetworkId::Id(id) => RawNetworkId::Id(id),
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::Any => write!(f, "*"),
            NetworkId::Id(id) => write!(f, "{}", id),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8545
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkProfile {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub network_id: NetworkId,
    /// Full endpoint, used instead of `http://host:port` when set.
    pub url: Option<String>,
    pub gas: Option<u64>,
    /// Wei.
    pub gas_price: Option<u64>,
    pub from: Option<String>,
    pub receipt_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

impl NetworkProfile {
    pub fn rpc_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }

    pub fn sender(&self) -> Result<Option<Address>> {
        self.from
            .as_deref()
            .map(|from| validation::validate_address("from", from))
            .transpose()
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(
            self.receipt_timeout_secs
                .unwrap_or(DEFAULT_RECEIPT_TIMEOUT_SECS),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    fn validate_as(&self, name: &str) -> Result<()> {
        let field = |f: &str| format!("networks.{}.{}", name, f);

        if self.url.is_none() {
            validation::validate_non_empty_string(&field("host"), &self.host)?;
            validation::validate_min(&field("port"), self.port, 1)?;
        }
        validation::validate_url(&field("url"), &self.rpc_url())?;

        if let Some(gas) = self.gas {
            validation::validate_min(&field("gas"), gas, MIN_GAS)?;
        }
        if let Some(gas_price) = self.gas_price {
            validation::validate_min(&field("gas_price"), gas_price, 1)?;
        }
        if let Some(from) = &self.from {
            validation::validate_address(&field("from"), from)?;
        }
        if let Some(timeout) = self.receipt_timeout_secs {
            validation::validate_min(&field("receipt_timeout_secs"), timeout, 1)?;
        }
        if let Some(interval) = self.poll_interval_ms {
            validation::validate_min(&field("poll_interval_ms"), interval, 1)?;
        }
        Ok(())
    }
}

impl NetworksConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeployError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| {
            DeployError::config("networks_toml_parsing", format!("Networks TOML parsing error: {}", e))
        })
    }

    /// Looks a profile up by its exact name.
    pub fn get(&self, name: &str) -> Result<&NetworkProfile> {
        self.networks.get(name).ok_or_else(|| {
            DeployError::config(
                "network",
                format!(
                    "Unknown network '{}'. Configured networks: {}",
                    name,
                    self.names().join(", ")
                ),
            )
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.networks.keys().map(String::as_str).collect()
    }
}

impl Validate for NetworksConfig {
    fn validate(&self) -> Result<()> {
        if self.networks.is_empty() {
            return Err(DeployError::MissingConfigError {
                field: "networks".to_string(),
            });
        }
        for (name, profile) in &self.networks {
            profile.validate_as(name)?;
        }
        Ok(())
    }
}
