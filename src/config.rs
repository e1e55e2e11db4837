//! Configuration management for the invocation relayer
//!
//! Loads configuration from a TOML file with environment variable substitution.

use crate::tx::ContractParam;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// GAS, the utility token fees are paid in
pub const DEFAULT_FEE_ASSET: &str =
    "0x602c79718b16e442de58778e148d0b1084e3b2dffd5de6b7b16cee7969282de7";

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    pub invocation: InvocationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Environment variable holding the WIF private key
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
        }
    }
}

/// What to invoke and who pays for it
#[derive(Debug, Clone, Deserialize)]
pub struct InvocationConfig {
    /// Paying address
    pub from: String,
    /// Contract script hash, `0x`-prefixed
    pub contract: String,
    pub operation: String,
    #[serde(default)]
    pub params: Vec<ContractParam>,
    #[serde(default = "default_fee_asset")]
    pub fee_asset: String,
    /// Build, sign and verify without broadcasting
    #[serde(default)]
    pub dry_run: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_private_key_env() -> String {
    "NEO_RELAYER_WIF".to_string()
}

fn default_fee_asset() -> String {
    DEFAULT_FEE_ASSET.to_string()
}

impl Settings {
    /// Load settings from `NEO_RELAYER_CONFIG`, or `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var("NEO_RELAYER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.rpc.url.trim().is_empty() {
            anyhow::bail!("rpc.url must be set");
        }
        if self.rpc.timeout_secs == 0 {
            anyhow::bail!("rpc.timeout_secs must be greater than zero");
        }
        if self.wallet.private_key_env.trim().is_empty() {
            anyhow::bail!("wallet.private_key_env must name an environment variable");
        }

        let invocation = &self.invocation;
        if invocation.from.trim().is_empty() {
            anyhow::bail!("invocation.from must be set");
        }
        if invocation.contract.trim().is_empty() {
            anyhow::bail!("invocation.contract must be set");
        }
        if invocation.operation.is_empty() {
            anyhow::bail!("invocation.operation must be set");
        }
        if invocation.dry_run {
            tracing::warn!("Dry run enabled - the transaction will not be broadcast");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    ENV_VAR
        .replace_all(input, |cap: &regex::Captures| {
            env::var(&cap[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[rpc]
url = "http://localhost:20332"

[invocation]
from = "AQzRMe3zyGS8W177xLJfewRRQZY2kddMun"
contract = "0x5b7074e873973a6ed3708862f219a6fbf4d1c411"
operation = "transfer"
params = [
    { type = "hash160", value = "0x5b7074e873973a6ed3708862f219a6fbf4d1c411" },
    { type = "integer", value = 100 },
]
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("NEO_RELAYER_TEST_VAR", "test_value");
        let input = "url = \"https://seed.example.com/${NEO_RELAYER_TEST_VAR}/rpc\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://seed.example.com/test_value/rpc\"");
    }

    #[test]
    fn test_unset_env_var_becomes_empty() {
        let result = substitute_env_vars("user = \"${NEO_RELAYER_SURELY_UNSET}\"");
        assert_eq!(result, "user = \"\"");
    }

    #[test]
    fn test_load_applies_defaults() {
        let file = write_config(SAMPLE);
        let settings = Settings::load_from(file.path()).unwrap();

        assert_eq!(settings.rpc.timeout_secs, 30);
        assert!(settings.rpc.user.is_none());
        assert_eq!(settings.wallet.private_key_env, "NEO_RELAYER_WIF");
        assert_eq!(settings.invocation.fee_asset, DEFAULT_FEE_ASSET);
        assert!(!settings.invocation.dry_run);
        assert_eq!(settings.invocation.params.len(), 2);
        assert_eq!(settings.invocation.params[1], ContractParam::Integer(100));
    }

    #[test]
    fn test_load_substitutes_credentials() {
        env::set_var("NEO_RELAYER_TEST_RPC_USER", "operator");
        let file = write_config(&SAMPLE.replace(
            "url = \"http://localhost:20332\"",
            "url = \"http://localhost:20332\"\nuser = \"${NEO_RELAYER_TEST_RPC_USER}\"",
        ));
        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.rpc.user.as_deref(), Some("operator"));
    }

    #[test]
    fn test_validation_rejects_empty_operation() {
        let file = write_config(&SAMPLE.replace("operation = \"transfer\"", "operation = \"\""));
        assert!(Settings::load_from(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(Settings::load_from(Path::new("/nonexistent/neo-relayer.toml")).is_err());
    }
}
