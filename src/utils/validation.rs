use crate::domain::model::{parse_address, Address};
use crate::utils::error::{DeployError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DeployError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_min<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
) -> Result<()> {
    if value < min {
        return Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min),
        });
    }
    Ok(())
}

/// Parses an address, tagging failures with the config field they came from.
pub fn validate_address(field_name: &str, value: &str) -> Result<Address> {
    parse_address(value).map_err(|e| match e {
        DeployError::InvalidAddress { value, reason } => DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value,
            reason,
        },
        other => other,
    })
}

/// Catches `${VAR}` placeholders the environment did not fill in.
pub fn validate_no_placeholder(field_name: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(DeployError::MissingConfigError {
            field: format!("{} (unresolved placeholder {})", field_name, value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("rpc", "http://127.0.0.1:8545").is_ok());
        assert!(validate_url("rpc", "https://example.com").is_ok());
        assert!(validate_url("rpc", "").is_err());
        assert!(validate_url("rpc", "invalid-url").is_err());
        assert!(validate_url("rpc", "ws://localhost:8546").is_err());
    }

    #[test]
    fn test_validate_min() {
        assert!(validate_min("networks.rinkeby.gas", 4_690_000u64, 21_000).is_ok());
        assert!(validate_min("networks.rinkeby.gas", 100u64, 21_000).is_err());
    }

    #[test]
    fn test_validate_address_reports_field() {
        let err = validate_address("wallet.address", "0x1234").unwrap_err();
        match err {
            DeployError::InvalidConfigValueError { field, .. } => assert_eq!(field, "wallet.address"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_no_placeholder() {
        assert!(validate_no_placeholder("wallet.address", "0xabc").is_ok());
        assert!(validate_no_placeholder("wallet.address", "${PASS_WALLET_ADDRESS}").is_err());
    }
}
