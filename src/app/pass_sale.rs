use crate::app::record::{read_record, RecordWriter};
use crate::config::network_config::{NetworkId, NetworkProfile};
use crate::config::plan_config::DeploymentPlan;
use crate::core::sequencer::{DeploymentContext, DeploymentSequencer, DeploymentStep};
use crate::core::steps::{Arg, CallContract, DeployContract};
use crate::domain::model::{
    Address, DeploymentInputs, DeploymentRecord, FundingSchedule, RecordStatus,
};
use crate::domain::ports::{ArtifactStore, ChainClient};
use crate::utils::error::{DeployError, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub const SET_SALE_FUNCTION: &str = "setTokenSaleAddress";

/// The four-step recipe: coin, whitelist, sale, then point the coin at the sale.
pub fn pass_sale_steps(
    plan: &DeploymentPlan,
    wallet: Address,
    artifacts: Arc<dyn ArtifactStore>,
) -> Vec<Box<dyn DeploymentStep>> {
    let names = &plan.contracts;

    let mut sale_args = vec![
        Arg::address_of(&names.coin),
        Arg::address_of(&names.whitelist),
        Arg::address(wallet),
        Arg::address(wallet),
    ];
    sale_args.extend(plan.schedule.as_array().into_iter().map(Arg::uint));

    let mut steps: Vec<Box<dyn DeploymentStep>> = Vec::with_capacity(4);
    steps.push(Box::new(DeployContract::new(
        &names.coin,
        vec![Arg::address(wallet)],
        Arc::clone(&artifacts),
    )));
    steps.push(Box::new(DeployContract::new(
        &names.whitelist,
        vec![],
        Arc::clone(&artifacts),
    )));
    steps.push(Box::new(DeployContract::new(
        &names.sale,
        sale_args,
        Arc::clone(&artifacts),
    )));
    steps.push(Box::new(CallContract::new(
        &names.coin,
        SET_SALE_FUNCTION,
        vec![Arg::address_of(&names.sale)],
        artifacts,
    )));
    steps
}

pub fn build_sequencer(
    plan: &DeploymentPlan,
    context: DeploymentContext,
    artifacts: Arc<dyn ArtifactStore>,
) -> Result<DeploymentSequencer> {
    let wallet = plan.wallet_address()?;
    let mut sequencer = DeploymentSequencer::new(context);
    for step in pass_sale_steps(plan, wallet, artifacts) {
        sequencer.add_step(step);
    }
    Ok(sequencer)
}

/// `label: 1521939600 (2018-03-25 01:00:00 UTC)` lines for the dry run.
pub fn render_schedule(schedule: &FundingSchedule) -> Vec<String> {
    FundingSchedule::LABELS
        .iter()
        .zip(schedule.as_array())
        .map(|(label, ts)| {
            let utc = i64::try_from(ts)
                .ok()
                .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "out of range".to_string());
            format!("{}: {} ({})", label, ts, utc)
        })
        .collect()
}

/// Everything a live run needs besides the chain client.
pub struct DeploymentRun<'a> {
    pub network_name: &'a str,
    pub profile: &'a NetworkProfile,
    pub plan: &'a DeploymentPlan,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub record_path: PathBuf,
    pub execution_id: String,
    pub sender: Option<Address>,
    pub resume: bool,
}

async fn verify_network(run: &DeploymentRun<'_>, chain: &dyn ChainClient) -> Result<u64> {
    let actual = chain.network_id().await?;
    match run.profile.network_id {
        NetworkId::Id(expected) if expected != actual => Err(DeployError::NetworkMismatch {
            network: run.network_name.to_string(),
            expected,
            actual,
        }),
        _ => {
            tracing::info!("🔗 Connected to network id {}", actual);
            Ok(actual)
        }
    }
}

async fn resolve_sender(run: &DeploymentRun<'_>, chain: &dyn ChainClient) -> Result<Address> {
    if let Some(sender) = run.sender {
        return Ok(sender);
    }
    if let Some(sender) = run.profile.sender()? {
        return Ok(sender);
    }
    let accounts = chain.accounts().await?;
    accounts
        .first()
        .copied()
        .ok_or_else(|| DeployError::MissingConfigError {
            field: "from (the node reports no unlocked accounts)".to_string(),
        })
}

/// Loads the record to continue from. Without `--resume` an unfinished record
/// at the same path is never overwritten.
fn previous_record(
    run: &DeploymentRun<'_>,
    network_id: u64,
    sender: Address,
    inputs: &DeploymentInputs,
) -> Result<Option<DeploymentRecord>> {
    let existing = read_record(&run.record_path)?;

    if !run.resume {
        return match existing {
            Some(record) if record.status != RecordStatus::Completed => {
                Err(DeployError::config(
                    "record",
                    format!(
                        "{} holds an unfinished deployment ({} completed step(s)); \
                         rerun with --resume or choose another --record",
                        run.record_path.display(),
                        record.steps.len()
                    ),
                ))
            }
            _ => Ok(None),
        };
    }

    let Some(record) = existing else {
        tracing::info!(
            "No record at {}, starting from scratch",
            run.record_path.display()
        );
        return Ok(None);
    };

    if record.network != run.network_name
        || record.network_id != Some(network_id)
        || record.plan != run.plan.plan.name
    {
        return Err(DeployError::config(
            "resume",
            format!(
                "{} belongs to plan '{}' on '{}' (id {:?}), not plan '{}' on '{}' (id {})",
                run.record_path.display(),
                record.plan,
                record.network,
                record.network_id,
                run.plan.plan.name,
                run.network_name,
                network_id
            ),
        ));
    }
    if record.sender != sender {
        return Err(DeployError::config(
            "resume",
            format!(
                "{} was sent from {}, this run sends from {}",
                run.record_path.display(),
                record.sender.to_checksum(None),
                sender.to_checksum(None)
            ),
        ));
    }
    if record.inputs != *inputs {
        return Err(DeployError::config(
            "resume",
            format!(
                "{} was deployed with a different wallet, schedule or contract names; \
                 choose another --record to start over",
                run.record_path.display()
            ),
        ));
    }

    tracing::info!(
        "♻️ Resuming from {} ({} completed step(s))",
        run.record_path.display(),
        record.steps.len()
    );
    Ok(Some(record))
}

/// Runs the Pass sale deployment. The record is written after every step and
/// once more at the end, whether the run succeeded or not.
pub async fn run_deployment(
    run: DeploymentRun<'_>,
    chain: &dyn ChainClient,
) -> Result<DeploymentRecord> {
    let network_id = verify_network(&run, chain).await?;
    let sender = resolve_sender(&run, chain).await?;
    tracing::info!("👤 Sending from {}", sender.to_checksum(None));

    let inputs = run.plan.inputs()?;
    let previous = previous_record(&run, network_id, sender, &inputs)?;
    let started_at = previous
        .as_ref()
        .map(|r| r.started_at)
        .unwrap_or_else(chrono::Utc::now);
    let previous_steps = previous.map(|r| r.steps).unwrap_or_default();

    let writer = RecordWriter::new(
        run.record_path.clone(),
        DeploymentRecord {
            execution_id: run.execution_id.clone(),
            plan: run.plan.plan.name.clone(),
            network: run.network_name.to_string(),
            network_id: Some(network_id),
            sender,
            inputs,
            started_at,
            finished_at: None,
            status: RecordStatus::InProgress,
            steps: Vec::new(),
            failure: None,
        },
    );

    let context = DeploymentContext::new(
        run.execution_id.clone(),
        run.network_name.to_string(),
        sender,
    )
    .with_gas(run.profile.gas, run.profile.gas_price)
    .with_previous_outputs(previous_steps);

    let mut sequencer = build_sequencer(run.plan, context, Arc::clone(&run.artifacts))?
        .with_listener(Box::new(writer.clone()));

    match sequencer.execute_all(chain).await {
        Ok(executed) => {
            let record = writer.snapshot(sequencer.context(), RecordStatus::Completed, None);
            writer.write(&record)?;
            tracing::info!(
                "📒 {} step(s) executed, record saved to {}",
                executed.len(),
                writer.path().display()
            );
            Ok(record)
        }
        Err(e) => {
            let record =
                writer.snapshot(sequencer.context(), RecordStatus::Failed, Some(e.to_string()));
            if let Err(write_err) = writer.write(&record) {
                tracing::error!("Could not write deployment record: {}", write_err);
            } else {
                tracing::warn!(
                    "📒 Partial deployment ({} step(s)) recorded in {}",
                    record.steps.len(),
                    writer.path().display()
                );
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{StepOutput, TxHash};
    use crate::domain::ports::Artifact;

    struct AnyArtifact;

    impl ArtifactStore for AnyArtifact {
        fn load(&self, contract: &str) -> Result<Artifact> {
            Ok(Artifact {
                contract_name: contract.to_string(),
                bytecode: vec![0x60],
                abi: None,
            })
        }
    }

    fn plan() -> DeploymentPlan {
        DeploymentPlan::from_toml_str(
            r#"
[plan]
name = "pass-ico"

[schedule]
funding_start_time = 1521939600
funding_pre_end_time = 1527209999
funding_sale1_end_time = 1529888399
funding_sale2_end_time = 1532393999
funding_end_time = 1532480399

[wallet]
address = "0xbb044e8a2237d2f4c201620430cccb167a40ba99"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_step_order_is_coin_whitelist_sale_setter() {
        let plan = plan();
        let wallet = plan.wallet_address().unwrap();
        let steps = pass_sale_steps(&plan, wallet, Arc::new(AnyArtifact));
        let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();

        assert_eq!(
            names,
            vec![
                "deploy PassCoin",
                "deploy PassContributorWhitelist",
                "deploy PassTokenSale",
                "call PassCoin.setTokenSaleAddress",
            ]
        );
    }

    #[test]
    fn test_sale_constructor_arguments() {
        let plan = plan();
        let wallet = plan.wallet_address().unwrap();
        let steps = pass_sale_steps(&plan, wallet, Arc::new(AnyArtifact));
        let wallet = wallet.to_checksum(None);

        assert_eq!(steps[0].describe(), format!("PassCoin({})", wallet));
        assert_eq!(steps[1].describe(), "PassContributorWhitelist()");
        assert_eq!(
            steps[2].describe(),
            format!(
                "PassTokenSale(PassCoin.address, PassContributorWhitelist.address, {w}, {w}, \
                 1521939600, 1527209999, 1529888399, 1532393999, 1532480399)",
                w = wallet
            )
        );
        assert_eq!(
            steps[3].describe(),
            "PassCoin.setTokenSaleAddress(PassTokenSale.address)"
        );
    }

    #[test]
    fn test_render_schedule_in_utc() {
        let lines = render_schedule(&plan().schedule);
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "funding_start_time: 1521939600 (2018-03-25 01:00:00 UTC)"
        );
        assert_eq!(
            lines[4],
            "funding_end_time: 1532480399 (2018-07-25 00:59:59 UTC)"
        );
    }

    #[test]
    fn test_schedule_labels_follow_constructor_order() {
        let schedule = FundingSchedule {
            funding_start_time: 1,
            funding_pre_end_time: 2,
            funding_sale1_end_time: 3,
            funding_sale2_end_time: 4,
            funding_end_time: 5,
        };
        let lines = render_schedule(&schedule);
        assert!(lines[2].starts_with("funding_sale1_end_time: 3"));
    }

    fn recorded(plan: &DeploymentPlan, status: RecordStatus) -> DeploymentRecord {
        DeploymentRecord {
            execution_id: "old".to_string(),
            plan: "pass-ico".to_string(),
            network: "rinkeby".to_string(),
            network_id: Some(4),
            sender: Address::repeat_byte(0xaa),
            inputs: plan.inputs().unwrap(),
            started_at: chrono::Utc::now(),
            finished_at: None,
            status,
            steps: vec![StepOutput {
                step: "deploy PassCoin".to_string(),
                contract: "PassCoin".to_string(),
                address: Some(Address::repeat_byte(1)),
                tx_hash: TxHash::with_last_byte(1),
                gas_used: None,
                block_number: None,
            }],
            failure: Some("boom".to_string()),
        }
    }

    fn profile() -> NetworkProfile {
        toml::from_str("host = \"localhost\"\nport = 8545\nnetwork_id = \"*\"\n").unwrap()
    }

    fn write_record(path: &std::path::Path, record: &DeploymentRecord) {
        std::fs::write(path, serde_json::to_string(record).unwrap()).unwrap();
    }

    #[test]
    fn test_resume_rejects_record_from_other_network() {
        let dir = tempfile::TempDir::new().unwrap();
        let record_path = dir.path().join("record.json");
        let plan = plan();
        write_record(&record_path, &recorded(&plan, RecordStatus::Failed));

        let profile = profile();
        let inputs = plan.inputs().unwrap();
        let sender = Address::repeat_byte(0xaa);
        let run = DeploymentRun {
            network_name: "development",
            profile: &profile,
            plan: &plan,
            artifacts: Arc::new(AnyArtifact),
            record_path: record_path.clone(),
            execution_id: "new".to_string(),
            sender: None,
            resume: true,
        };

        assert!(previous_record(&run, 4, sender, &inputs).is_err());

        let run = DeploymentRun {
            network_name: "rinkeby",
            ..run
        };
        let previous = previous_record(&run, 4, sender, &inputs).unwrap().unwrap();
        assert_eq!(previous.steps.len(), 1);
    }

    #[test]
    fn test_resume_rejects_changed_inputs_or_sender() {
        let dir = tempfile::TempDir::new().unwrap();
        let record_path = dir.path().join("record.json");
        let plan = plan();
        write_record(&record_path, &recorded(&plan, RecordStatus::Failed));

        let profile = profile();
        let run = DeploymentRun {
            network_name: "rinkeby",
            profile: &profile,
            plan: &plan,
            artifacts: Arc::new(AnyArtifact),
            record_path,
            execution_id: "new".to_string(),
            sender: None,
            resume: true,
        };
        let sender = Address::repeat_byte(0xaa);

        let mut other_wallet = plan.inputs().unwrap();
        other_wallet.wallet = Address::repeat_byte(0xcc);
        let err = previous_record(&run, 4, sender, &other_wallet).unwrap_err();
        assert!(err.to_string().contains("different wallet"));

        let mut later_close = plan.inputs().unwrap();
        later_close.schedule.funding_end_time += 3600;
        assert!(previous_record(&run, 4, sender, &later_close).is_err());

        let err = previous_record(&run, 4, Address::repeat_byte(0xdd), &plan.inputs().unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("was sent from"));
    }

    #[test]
    fn test_fresh_run_refuses_unfinished_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let record_path = dir.path().join("record.json");
        let plan = plan();
        let inputs = plan.inputs().unwrap();
        let sender = Address::repeat_byte(0xaa);
        let profile = profile();
        let run = DeploymentRun {
            network_name: "rinkeby",
            profile: &profile,
            plan: &plan,
            artifacts: Arc::new(AnyArtifact),
            record_path: record_path.clone(),
            execution_id: "new".to_string(),
            sender: None,
            resume: false,
        };

        assert!(previous_record(&run, 4, sender, &inputs).unwrap().is_none());

        write_record(&record_path, &recorded(&plan, RecordStatus::Failed));
        let err = previous_record(&run, 4, sender, &inputs).unwrap_err();
        assert!(matches!(err, DeployError::ConfigValidationError { .. }));
        assert!(err.to_string().contains("--resume"));

        write_record(&record_path, &recorded(&plan, RecordStatus::InProgress));
        assert!(previous_record(&run, 4, sender, &inputs).is_err());

        write_record(&record_path, &recorded(&plan, RecordStatus::Completed));
        assert!(previous_record(&run, 4, sender, &inputs).unwrap().is_none());
    }
}
