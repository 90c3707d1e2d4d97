//! Configuration management for the mint runner
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::chain::{EndpointPool, Network};
use crate::pacing::RandomRange;

use anyhow::{Context, Result};
use ethers::types::Address;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub runner: RunnerConfig,
    /// Keyed by network name
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Network all mints go to
    pub network: Network,
    /// Skip contracts the account already holds
    #[serde(default)]
    pub advanced_mint_mode: bool,
    pub referral: Address,
    #[serde(default = "default_keys_path")]
    pub keys_path: PathBuf,
    pub mint_amount: RandomRange,
    pub task_sleep: RandomRange,
    pub error_sleep: RandomRange,
    #[serde(default = "default_max_submit_attempts")]
    pub max_submit_attempts: u32,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    #[serde(default = "default_gas_limit_percent")]
    pub gas_limit_percent: u64,
    /// Unset means read-only queries retry forever
    #[serde(default)]
    pub query_timeout_secs: Option<u64>,
    /// Upper bound on a single RPC request
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub contracts: Vec<Address>,
    pub receipt_timeout_secs: Option<u64>,
    pub max_submit_attempts: Option<u32>,
}

fn default_keys_path() -> PathBuf {
    PathBuf::from("privates.txt")
}

fn default_max_submit_attempts() -> u32 {
    10
}

fn default_receipt_timeout_secs() -> u64 {
    500
}

fn default_gas_limit_percent() -> u64 {
    150
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Load settings from the file named by `MINTER_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var("MINTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        for name in self.chains.keys() {
            name.parse::<Network>()
                .with_context(|| format!("Unknown chain section [chains.{}]", name))?;
        }

        let target = self.runner.network;
        let chain = self
            .chain(target)
            .with_context(|| format!("No [chains.{}] section for the target network", target))?;
        if chain.rpc_urls.is_empty() {
            anyhow::bail!("Chain {} has no RPC URLs configured", target);
        }
        if chain.contracts.is_empty() {
            anyhow::bail!("Chain {} has no mint contracts configured", target);
        }

        if self.max_submit_attempts(target) == 0 {
            anyhow::bail!("max_submit_attempts must be at least 1");
        }
        if self.runner.rpc_timeout_secs == 0 {
            anyhow::bail!("rpc_timeout_secs must be at least 1");
        }
        if self.runner.gas_limit_percent < 100 {
            anyhow::bail!(
                "gas_limit_percent must be at least 100, got {}",
                self.runner.gas_limit_percent
            );
        }

        for (name, chain) in &self.chains {
            if chain.rpc_urls.is_empty() {
                tracing::warn!("Chain {} has no RPC URLs - accounts will not connect to it", name);
            }
        }

        Ok(())
    }

    /// Chain section for a network
    pub fn chain(&self, network: Network) -> Option<&ChainConfig> {
        self.chains.get(network.as_str())
    }

    /// Mint contracts on a network
    pub fn contracts(&self, network: Network) -> &[Address] {
        self.chain(network)
            .map(|c| c.contracts.as_slice())
            .unwrap_or(&[])
    }

    pub fn max_submit_attempts(&self, network: Network) -> u32 {
        self.chain(network)
            .and_then(|c| c.max_submit_attempts)
            .unwrap_or(self.runner.max_submit_attempts)
    }

    pub fn receipt_timeout(&self, network: Network) -> Duration {
        let secs = self
            .chain(network)
            .and_then(|c| c.receipt_timeout_secs)
            .unwrap_or(self.runner.receipt_timeout_secs);
        Duration::from_secs(secs)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.runner.query_timeout_secs.map(Duration::from_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.runner.rpc_timeout_secs)
    }

    /// RPC endpoints of every configured network
    pub fn endpoint_pool(&self) -> EndpointPool {
        let endpoints = self
            .chains
            .iter()
            .filter_map(|(name, chain)| {
                let network = name.parse::<Network>().ok()?;
                Some((network, chain.rpc_urls.clone()))
            })
            .collect();
        EndpointPool::new(endpoints)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
