#[cfg(feature = "cli")]
pub mod cli;
pub mod network_config;
pub mod plan_config;

use crate::utils::error::{DeployError, Result};
use regex::Regex;

/// Replaces `${VAR}` with the environment value. Unset variables stay verbatim
/// so validation can name them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| DeployError::config("env_substitution", e.to_string()))?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PASS_DEPLOY_TEST_HOST", "10.0.0.7");
        let out = substitute_env_vars("host = \"${PASS_DEPLOY_TEST_HOST}\"\nport = ${PASS_DEPLOY_TEST_MISSING}").unwrap();
        std::env::remove_var("PASS_DEPLOY_TEST_HOST");

        assert_eq!(out, "host = \"10.0.0.7\"\nport = ${PASS_DEPLOY_TEST_MISSING}");
    }
}
