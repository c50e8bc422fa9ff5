//! Calldata for constructors and calls.
//!
//! When the artifact carries an ABI, encoding goes through the matching
//! `JsonAbi` entry so argument types are checked against the contract. Without
//! one, the arguments are encoded as a plain parameter tuple.

use crate::utils::error::{DeployError, Result};
use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::keccak256;

/// First four bytes of `keccak256(signature)`, e.g. `transfer(address,uint256)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_args(args: &[DynSolValue]) -> Vec<u8> {
    if args.is_empty() {
        return Vec::new();
    }
    DynSolValue::Tuple(args.to_vec()).abi_encode_params()
}

/// Builds `name(type,...)` from the Solidity type names of the arguments.
pub fn signature(name: &str, types: &[&str]) -> String {
    format!("{}({})", name, types.join(","))
}

/// Functions named `name` whose inputs have exactly these types.
pub fn find_function<'a>(abi: &'a JsonAbi, name: &str, types: &[&str]) -> Option<&'a Function> {
    abi.function(name)?.iter().find(|function| {
        function.inputs.len() == types.len()
            && function
                .inputs
                .iter()
                .zip(types)
                .all(|(param, ty)| param.ty == *ty)
    })
}

/// Creation payload: bytecode followed by the encoded constructor arguments.
pub fn encode_constructor(
    contract: &str,
    bytecode: &[u8],
    abi: Option<&JsonAbi>,
    args: &[DynSolValue],
) -> Result<Vec<u8>> {
    let encoded = match abi.and_then(|abi| abi.constructor.as_ref()) {
        Some(constructor) => constructor.abi_encode_input(args).map_err(|e| {
            DeployError::ArtifactError {
                contract: contract.to_string(),
                message: format!("constructor arguments do not match the ABI: {}", e),
            }
        })?,
        None => encode_args(args),
    };

    let mut data = Vec::with_capacity(bytecode.len() + encoded.len());
    data.extend_from_slice(bytecode);
    data.extend(encoded);
    Ok(data)
}

/// Selector followed by the encoded arguments.
pub fn encode_call(
    contract: &str,
    name: &str,
    types: &[&str],
    abi: Option<&JsonAbi>,
    args: &[DynSolValue],
) -> Result<Vec<u8>> {
    match abi.and_then(|abi| find_function(abi, name, types)) {
        Some(function) => function
            .abi_encode_input(args)
            .map_err(|e| DeployError::ArtifactError {
                contract: contract.to_string(),
                message: format!("arguments of {} do not match the ABI: {}", name, e),
            }),
        None => {
            let mut data = selector(&signature(name, types)).to_vec();
            data.extend(encode_args(args));
            Ok(data)
        }
    }
}
