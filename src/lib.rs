pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::rpc::JsonRpcClient;
pub use app::pass_sale::{run_deployment, DeploymentRun};
pub use config::{network_config::NetworksConfig, plan_config::DeploymentPlan};
pub use core::{artifacts::LocalArtifacts, sequencer::DeploymentSequencer};
pub use domain::model::{parse_address, Address, DeploymentRecord, TxHash};
pub use utils::error::{DeployError, Result};
