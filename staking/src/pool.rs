//! Staking pools.

use crate::error::StakingError;
use gdao_types::{Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

/// Pool identifier.
pub type PoolId = u32;

const DAY: u64 = 24 * 3600;

/// Whether principal can leave a position at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakingMode {
    Flexible,
    Locked,
}

/// Static definition of a pool, as it appears in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub id: PoolId,
    pub mode: StakingMode,
    /// Annual percentage rate in basis points (2500 = 25%).
    pub apr_bps: u32,
    pub min_stake: TokenAmount,
    /// Required for locked pools, ignored for flexible ones.
    #[serde(default)]
    pub lock_duration_secs: Option<u64>,
}

impl PoolConfig {
    /// The reference pools: 15% flexible and 25% locked for 30 days.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                id: 1,
                mode: StakingMode::Flexible,
                apr_bps: 1500,
                min_stake: TokenAmount::from_tokens(1000),
                lock_duration_secs: None,
            },
            Self {
                id: 2,
                mode: StakingMode::Locked,
                apr_bps: 2500,
                min_stake: TokenAmount::from_tokens(5000),
                lock_duration_secs: Some(30 * DAY),
            },
        ]
    }

    pub fn validate(&self) -> Result<(), StakingError> {
        match (self.mode, self.lock_duration_secs) {
            (StakingMode::Locked, None) => Err(StakingError::InvalidPoolConfig(format!(
                "locked pool {} has no lock duration",
                self.id
            ))),
            _ => Ok(()),
        }
    }
}

/// A pool with its running totals.
///
/// Only `total_staked` and `total_rewards_distributed` change after
/// initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPool {
    pub config: PoolConfig,
    pub total_staked: TokenAmount,
    pub total_rewards_distributed: TokenAmount,
}

impl StakingPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            total_staked: TokenAmount::ZERO,
            total_rewards_distributed: TokenAmount::ZERO,
        }
    }

    pub fn id(&self) -> PoolId {
        self.config.id
    }

    pub fn mode(&self) -> StakingMode {
        self.config.mode
    }

    /// Maturity of a position opened at `start`; `None` for flexible pools.
    pub fn lock_end(&self, start: Timestamp) -> Option<Timestamp> {
        match self.config.mode {
            StakingMode::Flexible => None,
            StakingMode::Locked => self.config.lock_duration_secs.map(|secs| start.plus_secs(secs)),
        }
    }
}
