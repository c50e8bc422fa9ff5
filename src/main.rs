use clap::Parser;
use pass_deploy::app::pass_sale::{build_sequencer, render_schedule};
use pass_deploy::core::sequencer::DeploymentContext;
use pass_deploy::domain::ports::ArtifactStore;
use pass_deploy::utils::{logger, validation, validation::Validate};
use pass_deploy::{
    run_deployment, Address, CliConfig, DeployError, DeploymentPlan, DeploymentRun,
    DeploymentSequencer, JsonRpcClient, LocalArtifacts, NetworksConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

fn fail(e: &DeployError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn load_configs(config: &CliConfig) -> Result<(NetworksConfig, DeploymentPlan), DeployError> {
    let networks = NetworksConfig::from_file(&config.networks)?;
    networks.validate()?;
    let plan = DeploymentPlan::from_file(&config.plan)?;
    plan.validate()?;
    Ok((networks, plan))
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting pass-deploy");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let (networks, plan) = load_configs(&config).unwrap_or_else(|e| fail(&e));
    let profile = networks.get(&config.network).unwrap_or_else(|e| fail(&e));
    let sender_override = config
        .from
        .as_deref()
        .map(|from| validation::validate_address("from", from))
        .transpose()
        .unwrap_or_else(|e| fail(&e));

    let execution_id = config
        .execution_id
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().format("deploy_%Y%m%d_%H%M%S").to_string());
    let record_path = PathBuf::from(config.record_path(&plan.plan.name));
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(LocalArtifacts::new(&config.artifacts));

    match &plan.plan.description {
        Some(description) => println!("🚀 Plan: {} ({})", plan.plan.name, description),
        None => println!("🚀 Plan: {}", plan.plan.name),
    }
    println!("🌐 Network: {} at {}", config.network, profile.rpc_url());
    println!("🆔 Execution ID: {}", execution_id);
    println!("📦 Artifacts: {}", config.artifacts);

    if config.dry_run {
        println!("📅 Funding schedule:");
        for line in render_schedule(&plan.schedule) {
            println!("   {}", line);
        }

        let context = DeploymentContext::new(
            execution_id.clone(),
            config.network.clone(),
            sender_override.unwrap_or(Address::ZERO),
        )
        .with_gas(profile.gas, profile.gas_price);
        let sequencer =
            build_sequencer(&plan, context, artifacts).unwrap_or_else(|e| fail(&e));
        sequencer.preflight().unwrap_or_else(|e| fail(&e));

        println!("📋 Steps:");
        for (index, step) in sequencer.steps().iter().enumerate() {
            println!("   {}. {}", index + 1, step.describe());
        }
        println!("✅ Dry run complete, nothing was sent");
        return;
    }

    let client = JsonRpcClient::new(profile.rpc_url())
        .unwrap_or_else(|e| fail(&e))
        .with_receipt_polling(profile.receipt_timeout(), profile.poll_interval());

    let run = DeploymentRun {
        network_name: &config.network,
        profile,
        plan: &plan,
        artifacts,
        record_path,
        execution_id,
        sender: sender_override,
        resume: config.resume,
    };

    match run_deployment(run, &client).await {
        Ok(record) => {
            let summary = DeploymentSequencer::summary(&record.steps);
            tracing::info!("📊 Summary: {}", serde_json::Value::Object(summary));

            println!("✅ Deployment completed successfully!");
            for step in &record.steps {
                if let Some(address) = step.address {
                    println!("📍 {}: {}", step.contract, address.to_checksum(None));
                }
            }
            println!(
                "📁 Record saved to: {}",
                config.record_path(&record.plan)
            );
        }
        Err(e) => fail(&e),
    }
}
