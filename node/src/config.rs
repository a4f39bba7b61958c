//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};

use gdao_ledger::{Allocation, GenesisConfig};
use gdao_staking::{PoolConfig, RewardSource};
use gdao_types::{Environment, GovernanceParams, TokenParams};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a GDAO node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Plain values come first and
/// tables last so the struct always serializes to valid TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Deployment environment. Picks the governance policy when
    /// `governance` is not set.
    #[serde(default)]
    pub environment: Environment,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where staking rewards come from: "mint" or "treasury".
    #[serde(default)]
    pub reward_source: RewardSource,

    /// Whether executed transfer proposals are settled through the
    /// settlement collaborator before balances move.
    #[serde(default)]
    pub settle_on_chain: bool,

    /// Upper bound on one `submit_on_chain` call.
    #[serde(default = "default_settlement_timeout_secs")]
    pub settlement_timeout_secs: u64,

    /// Period of the background sweep that resolves every open proposal.
    /// Zero disables it and leaves resolution fully lazy.
    #[serde(default)]
    pub sweep_interval_secs: u64,

    /// Whether to expose Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Token definition and treasury share.
    #[serde(default)]
    pub token: TokenParams,

    /// Governance policy override.
    #[serde(default)]
    pub governance: Option<GovernanceParams>,

    /// Staking pools created at genesis.
    #[serde(default = "PoolConfig::defaults")]
    pub pools: Vec<PoolConfig>,

    /// Initial balances credited at genesis.
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_settlement_timeout_secs() -> u64 {
    30
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings no node could start with.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.log_format()?;
        if self.settlement_timeout_secs == 0 {
            return Err(NodeError::Config(
                "settlement_timeout_secs must be positive".to_string(),
            ));
        }
        if !self.governance_params().is_valid() {
            return Err(NodeError::Config(
                "governance fractions must not exceed 10000 bps".to_string(),
            ));
        }
        for pool in &self.pools {
            pool.validate()?;
        }
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// The explicit policy if one is configured, otherwise the environment's.
    pub fn governance_params(&self) -> GovernanceParams {
        self.governance
            .clone()
            .unwrap_or_else(|| self.environment.governance_params())
    }

    pub fn genesis(&self) -> GenesisConfig {
        GenesisConfig {
            token: self.token.clone(),
            allocations: self.allocations.clone(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            reward_source: RewardSource::default(),
            settle_on_chain: false,
            settlement_timeout_secs: default_settlement_timeout_secs(),
            sweep_interval_secs: 0,
            enable_metrics: false,
            token: TokenParams::default(),
            governance: None,
            pools: PoolConfig::defaults(),
            allocations: Vec::new(),
        }
    }
}
