//! Staking: locking balances into yield-bearing positions.
//!
//! `reward = principal × apr × elapsed / year`, accrued linearly (no
//! compounding) from the later of the position start and its last claim.
//!
//! This crate handles:
//! - Pool definitions (flexible or locked, APR, minimum stake)
//! - Opening, claiming and closing positions against the ledger
//! - Reward previews and aggregate pool statistics

pub mod engine;
pub mod error;
pub mod pool;
pub mod position;
pub mod reward;

pub use engine::{PoolStats, StakingEngine, StakingStats};
pub use error::StakingError;
pub use pool::{PoolConfig, PoolId, StakingMode, StakingPool};
pub use position::{PositionId, PositionView, StakingPosition};
pub use reward::{accrued_reward, RewardSource, SECONDS_PER_YEAR};
