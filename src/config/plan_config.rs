use crate::config::substitute_env_vars;
use crate::domain::model::{Address, DeploymentInputs, FundingSchedule};
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One deployment plan. Each plan lives in its own file and is picked with `--plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub plan: PlanInfo,
    pub schedule: FundingSchedule,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub contracts: ContractNames,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Multisig wallet that receives the raised funds.
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractNames {
    #[serde(default = "default_coin")]
    pub coin: String,
    #[serde(default = "default_whitelist")]
    pub whitelist: String,
    #[serde(default = "default_sale")]
    pub sale: String,
}

fn default_coin() -> String {
    "PassCoin".to_string()
}

fn default_whitelist() -> String {
    "PassContributorWhitelist".to_string()
}

fn default_sale() -> String {
    "PassTokenSale".to_string()
}

impl Default for ContractNames {
    fn default() -> Self {
        Self {
            coin: default_coin(),
            whitelist: default_whitelist(),
            sale: default_sale(),
        }
    }
}

impl DeploymentPlan {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeployError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| {
            DeployError::config("plan_toml_parsing", format!("Plan TOML parsing error: {}", e))
        })
    }

    pub fn wallet_address(&self) -> Result<Address> {
        validation::validate_no_placeholder("wallet.address", &self.wallet.address)?;
        validation::validate_address("wallet.address", &self.wallet.address)
    }

    /// The values the deployed contracts are built from.
    pub fn inputs(&self) -> Result<DeploymentInputs> {
        Ok(DeploymentInputs {
            wallet: self.wallet_address()?,
            schedule: self.schedule,
            coin: self.contracts.coin.clone(),
            whitelist: self.contracts.whitelist.clone(),
            sale: self.contracts.sale.clone(),
        })
    }
}

impl Validate for DeploymentPlan {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("plan.name", &self.plan.name)?;
        self.schedule.validate()?;
        self.wallet_address()?;

        let names = [
            ("contracts.coin", &self.contracts.coin),
            ("contracts.whitelist", &self.contracts.whitelist),
            ("contracts.sale", &self.contracts.sale),
        ];
        let mut seen = HashSet::new();
        for (field, name) in names {
            validation::validate_non_empty_string(field, name)?;
            if !seen.insert(name.as_str()) {
                return Err(DeployError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: name.clone(),
                    reason: "contract names must be distinct".to_string(),
                });
            }
        }
        Ok(())
    }
}
