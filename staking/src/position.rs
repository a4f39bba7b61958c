//! Staking positions.

use crate::pool::{PoolId, StakingMode};
use gdao_types::{Address, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

/// Position identifier, assigned sequentially.
pub type PositionId = u64;

/// Principal locked by one `stake` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPosition {
    pub id: PositionId,
    pub owner: Address,
    pub pool_id: PoolId,
    pub principal: TokenAmount,
    pub start_time: Timestamp,
    /// Maturity for locked pools.
    pub end_time: Option<Timestamp>,
    pub rewards_claimed: TokenAmount,
    /// Start of the current accrual window.
    pub last_claim_time: Timestamp,
}

impl StakingPosition {
    /// Whether principal is still bound at `now`.
    pub fn is_locked_at(&self, now: Timestamp) -> bool {
        self.end_time.is_some_and(|end| now < end)
    }
}

/// Read-only view of a position for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub id: PositionId,
    pub pool_id: PoolId,
    pub mode: StakingMode,
    pub principal: TokenAmount,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub pending_rewards: TokenAmount,
    pub rewards_claimed: TokenAmount,
    pub locked: bool,
}
