use crate::core::sequencer::{DeploymentContext, ProgressListener};
use crate::domain::model::{DeploymentRecord, RecordStatus};
use crate::utils::error::{DeployError, Result};
use std::path::{Path, PathBuf};

/// Persists the deployment record; rewritten after every completed step so an
/// interrupted run still leaves an accurate ledger behind.
#[derive(Debug, Clone)]
pub struct RecordWriter {
    path: PathBuf,
    template: DeploymentRecord,
}

impl RecordWriter {
    pub fn new(path: impl Into<PathBuf>, template: DeploymentRecord) -> Self {
        Self {
            path: path.into(),
            template,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(
        &self,
        context: &DeploymentContext,
        status: RecordStatus,
        failure: Option<String>,
    ) -> DeploymentRecord {
        let finished_at = match status {
            RecordStatus::InProgress => None,
            RecordStatus::Completed | RecordStatus::Failed => Some(chrono::Utc::now()),
        };
        DeploymentRecord {
            status,
            finished_at,
            failure,
            steps: context.outputs().to_vec(),
            ..self.template.clone()
        }
    }

    pub fn write(&self, record: &DeploymentRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!("Deployment record written to {}", self.path.display());
        Ok(())
    }
}

impl ProgressListener for RecordWriter {
    fn step_completed(&self, context: &DeploymentContext) -> Result<()> {
        self.write(&self.snapshot(context, RecordStatus::InProgress, None))
    }
}

/// Reads a record if one exists at `path`.
pub fn read_record(path: &Path) -> Result<Option<DeploymentRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(DeployError::SerializationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Address, DeploymentInputs, FundingSchedule, StepOutput, TxHash};
    use tempfile::TempDir;

    fn template() -> DeploymentRecord {
        DeploymentRecord {
            execution_id: "deploy_test".to_string(),
            plan: "pass-ico".to_string(),
            network: "development".to_string(),
            network_id: Some(1337),
            sender: Address::repeat_byte(0xaa),
            inputs: DeploymentInputs {
                wallet: Address::repeat_byte(0xbb),
                schedule: FundingSchedule {
                    funding_start_time: 1521939600,
                    funding_pre_end_time: 1527209999,
                    funding_sale1_end_time: 1529888399,
                    funding_sale2_end_time: 1532393999,
                    funding_end_time: 1532480399,
                },
                coin: "PassCoin".to_string(),
                whitelist: "PassContributorWhitelist".to_string(),
                sale: "PassTokenSale".to_string(),
            },
            started_at: chrono::Utc::now(),
            finished_at: None,
            status: RecordStatus::InProgress,
            steps: Vec::new(),
            failure: None,
        }
    }

    #[test]
    fn test_listener_writes_progress_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/record.json");
        let writer = RecordWriter::new(&path, template());

        let mut context = DeploymentContext::new(
            "deploy_test".to_string(),
            "development".to_string(),
            Address::repeat_byte(0xaa),
        );
        context.add_output(StepOutput {
            step: "deploy PassCoin".to_string(),
            contract: "PassCoin".to_string(),
            address: Some(Address::repeat_byte(1)),
            tx_hash: TxHash::with_last_byte(1),
            gas_used: Some(1_000_000),
            block_number: Some(3),
        });
        writer.step_completed(&context).unwrap();

        let record = read_record(&path).unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::InProgress);
        assert_eq!(record.steps.len(), 1);
        assert_eq!(record.finished_at, None);
        assert_eq!(record.inputs, template().inputs);
        assert_eq!(record.steps[0].tx_hash, TxHash::with_last_byte(1));

        writer
            .write(&writer.snapshot(&context, RecordStatus::Failed, Some("boom".to_string())))
            .unwrap();
        let record = read_record(&path).unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Failed);
        assert_eq!(record.failure.as_deref(), Some("boom"));
        assert!(record.finished_at.is_some());
    }

    #[test]
    fn test_missing_record_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_record(&dir.path().join("absent.json")).unwrap().is_none());
    }
}
