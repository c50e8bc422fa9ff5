use crate::domain::model::{Address, StepOutput, TxRequest};
use crate::domain::ports::ChainClient;
use crate::utils::error::{DeployError, Result};
use std::time::Instant;

/// State shared along the sequence: who sends, with what gas settings, and
/// what every completed step produced.
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    pub execution_id: String,
    pub network: String,
    pub sender: Address,
    pub gas: Option<u64>,
    pub gas_price: Option<u64>,
    outputs: Vec<StepOutput>,
}

impl DeploymentContext {
    pub fn new(execution_id: String, network: String, sender: Address) -> Self {
        Self {
            execution_id,
            network,
            sender,
            gas: None,
            gas_price: None,
            outputs: Vec::new(),
        }
    }

    pub fn with_gas(mut self, gas: Option<u64>, gas_price: Option<u64>) -> Self {
        self.gas = gas;
        self.gas_price = gas_price;
        self
    }

    /// Seeds outputs from an earlier, interrupted run.
    pub fn with_previous_outputs(mut self, outputs: Vec<StepOutput>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn outputs(&self) -> &[StepOutput] {
        &self.outputs
    }

    pub fn add_output(&mut self, output: StepOutput) {
        self.outputs.push(output);
    }

    pub fn is_completed(&self, step: &str) -> bool {
        self.outputs.iter().any(|o| o.step == step)
    }

    /// Address of the most recent deployment of `contract`.
    pub fn address_of(&self, contract: &str) -> Option<Address> {
        self.outputs
            .iter()
            .rev()
            .filter(|o| o.contract == contract)
            .find_map(|o| o.address)
    }

    pub fn require_address(&self, contract: &str) -> Result<Address> {
        self.address_of(contract).ok_or_else(|| {
            DeployError::config(
                "sequence",
                format!("{} has not been deployed by an earlier step", contract),
            )
        })
    }

    pub fn transaction(&self, to: Option<Address>, data: Vec<u8>) -> TxRequest {
        TxRequest {
            from: self.sender,
            to,
            data,
            gas: self.gas,
            gas_price: self.gas_price,
        }
    }
}

/// One unit of the deployment recipe.
#[async_trait::async_trait]
pub trait DeploymentStep: Send + Sync {
    fn name(&self) -> &str;

    /// Human-readable summary for dry runs.
    fn describe(&self) -> String;

    /// Checks that need no chain access (artifacts, ABI shape). Run for every
    /// step before the first transaction is sent.
    fn preflight(&self) -> Result<()> {
        Ok(())
    }

    fn should_execute(&self, context: &DeploymentContext) -> bool {
        !context.is_completed(self.name())
    }

    async fn execute(
        &self,
        context: &DeploymentContext,
        chain: &dyn ChainClient,
    ) -> Result<StepOutput>;
}

/// Called after every completed step, e.g. to persist the record.
pub trait ProgressListener: Send + Sync {
    fn step_completed(&self, context: &DeploymentContext) -> Result<()>;
}

/// Runs steps one after another; a step only starts once the previous one
/// has a mined receipt.
pub struct DeploymentSequencer {
    steps: Vec<Box<dyn DeploymentStep>>,
    context: DeploymentContext,
    listener: Option<Box<dyn ProgressListener>>,
}

impl DeploymentSequencer {
    pub fn new(context: DeploymentContext) -> Self {
        Self {
            steps: Vec::new(),
            context,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Box<dyn ProgressListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn add_step(&mut self, step: Box<dyn DeploymentStep>) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Box<dyn DeploymentStep>] {
        &self.steps
    }

    pub fn context(&self) -> &DeploymentContext {
        &self.context
    }

    pub fn preflight(&self) -> Result<()> {
        for step in &self.steps {
            step.preflight()?;
        }
        Ok(())
    }

    /// Executes every pending step. Stops at the first failure; outputs of the
    /// steps that did complete stay available through [`Self::context`].
    pub async fn execute_all(&mut self, chain: &dyn ChainClient) -> Result<Vec<StepOutput>> {
        self.preflight()?;

        let mut executed = Vec::new();
        for step in &self.steps {
            if !step.should_execute(&self.context) {
                tracing::info!("⏭️ Skipping step: {} (already completed)", step.name());
                continue;
            }

            tracing::info!("🚚 Running step: {}", step.name());
            let start_time = Instant::now();

            match step.execute(&self.context, chain).await {
                Ok(output) => {
                    tracing::info!(
                        "✅ Step completed: {} (tx: {}, address: {}, duration: {:?})",
                        output.step,
                        output.tx_hash,
                        output
                            .address
                            .map(|a| a.to_checksum(None))
                            .unwrap_or_else(|| "-".to_string()),
                        start_time.elapsed()
                    );
                    self.context.add_output(output.clone());
                    executed.push(output);

                    if let Some(listener) = &self.listener {
                        listener.step_completed(&self.context)?;
                    }
                }
                Err(e) => {
                    tracing::error!("❌ Step failed: {}: {}", step.name(), e);
                    return Err(DeployError::StepFailed {
                        step: step.name().to_string(),
                        completed: self.context.outputs().len(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(executed)
    }

    /// Totals for logging and the final summary.
    pub fn summary(outputs: &[StepOutput]) -> serde_json::Map<String, serde_json::Value> {
        let mut summary = serde_json::Map::new();
        let total_gas: u64 = outputs.iter().filter_map(|o| o.gas_used).sum();

        summary.insert("total_steps".to_string(), outputs.len().into());
        summary.insert("total_gas_used".to_string(), total_gas.into());
        summary.insert(
            "executed_steps".to_string(),
            serde_json::Value::Array(
                outputs
                    .iter()
                    .map(|o| serde_json::Value::String(o.step.clone()))
                    .collect(),
            ),
        );
        summary
    }
}
