use crate::domain::ports::{Artifact, ArtifactStore};
use crate::utils::error::{DeployError, Result};
use alloy::json_abi::JsonAbi;
use alloy::primitives::hex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Truffle build output: `<dir>/<ContractName>.json`.
#[derive(Debug, Clone)]
pub struct LocalArtifacts {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: Option<String>,
    bytecode: Option<String>,
    abi: Option<JsonAbi>,
}

impl LocalArtifacts {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn path_for(&self, contract: &str) -> PathBuf {
        Path::new(&self.base_path).join(format!("{}.json", contract))
    }
}

impl ArtifactStore for LocalArtifacts {
    fn load(&self, contract: &str) -> Result<Artifact> {
        let path = self.path_for(contract);
        let artifact_error = |message: String| DeployError::ArtifactError {
            contract: contract.to_string(),
            message,
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| artifact_error(format!("cannot read {}: {}", path.display(), e)))?;
        let file: ArtifactFile = serde_json::from_str(&content)
            .map_err(|e| artifact_error(format!("invalid JSON in {}: {}", path.display(), e)))?;

        if let Some(name) = &file.contract_name {
            if name != contract {
                return Err(artifact_error(format!(
                    "{} describes contract '{}'",
                    path.display(),
                    name
                )));
            }
        }

        let bytecode = parse_bytecode(file.bytecode.as_deref().unwrap_or_default())
            .map_err(artifact_error)?;

        tracing::debug!("Loaded artifact {} ({} bytes of bytecode)", contract, bytecode.len());

        Ok(Artifact {
            contract_name: contract.to_string(),
            bytecode,
            abi: file.abi,
        })
    }
}

fn parse_bytecode(raw: &str) -> std::result::Result<Vec<u8>, String> {
    let digits = raw.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Err("bytecode is empty; the contract is abstract or was not compiled".to_string());
    }
    if digits.contains("__") {
        return Err("bytecode has unlinked library placeholders".to_string());
    }
    hex::decode(digits).map_err(|e| format!("bytecode is not valid hex: {}", e))
}

impl Artifact {
    /// Number of constructor inputs declared in the ABI, if the ABI is present.
    /// Contracts without an explicit constructor take none.
    pub fn constructor_arity(&self) -> Option<usize> {
        let abi = self.abi.as_ref()?;
        Some(abi.constructor.as_ref().map(|c| c.inputs.len()).unwrap_or(0))
    }

    /// Whether the ABI declares a function with this name and input types.
    /// Without an ABI nothing can be checked, so this answers `true`.
    pub fn has_function(&self, name: &str, input_types: &[&str]) -> bool {
        match &self.abi {
            Some(abi) => crate::core::abi::find_function(abi, name, input_types).is_some(),
            None => true,
        }
    }
}
