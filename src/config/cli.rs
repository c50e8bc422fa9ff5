use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "pass-deploy")]
#[command(about = "Deploys the Pass token-sale contracts to an Ethereum network")]
pub struct CliConfig {
    /// Network profile table
    #[arg(long, default_value = "configs/networks.toml")]
    pub networks: String,

    /// Deployment plan (schedule, wallet, contract names)
    #[arg(long, default_value = "configs/plan.toml")]
    pub plan: String,

    /// Profile name from the network table
    #[arg(short, long, default_value = "development")]
    pub network: String,

    /// Directory holding <Contract>.json build artifacts
    #[arg(long, default_value = "build/contracts")]
    pub artifacts: String,

    /// Sender account; overrides the profile's `from`
    #[arg(long)]
    pub from: Option<String>,

    /// Where to write the deployment record (default: deployments/<network>-<plan>.json)
    #[arg(long)]
    pub record: Option<String>,

    /// Continue an unfinished record, skipping its completed steps
    #[arg(long)]
    pub resume: bool,

    /// Print the schedule and planned steps without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Execution ID for this run
    #[arg(long)]
    pub execution_id: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl CliConfig {
    pub fn record_path(&self, plan_name: &str) -> String {
        self.record
            .clone()
            .unwrap_or_else(|| format!("deployments/{}-{}.json", self.network, plan_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_defaults_and_record_path() {
        let config = CliConfig::parse_from(["pass-deploy", "--network", "rinkeby"]);
        assert_eq!(config.networks, "configs/networks.toml");
        assert_eq!(config.artifacts, "build/contracts");
        assert!(!config.dry_run);
        assert_eq!(config.record_path("pass-ico"), "deployments/rinkeby-pass-ico.json");

        let config = CliConfig::parse_from(["pass-deploy", "--record", "out.json", "--resume"]);
        assert_eq!(config.record_path("pass-ico"), "out.json");
        assert!(config.resume);
    }

    #[test]
    fn test_dry_run_help_matches_output() {
        let command = CliConfig::command();
        let dry_run = command
            .get_arguments()
            .find(|arg| arg.get_id() == "dry_run")
            .unwrap();
        let help = dry_run.get_help().unwrap().to_string();
        assert!(help.contains("planned steps"));
        assert!(!help.contains("encoded"));
    }
}
