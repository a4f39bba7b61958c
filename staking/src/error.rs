//! Staking errors.

use crate::pool::PoolId;
use crate::position::PositionId;
use gdao_ledger::LedgerError;
use gdao_store::StoreError;
use gdao_types::{Timestamp, TokenAmount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StakingError {
    #[error("unknown staking pool {0}")]
    UnknownPool(PoolId),

    #[error("stake of {amount} is below the pool minimum of {minimum}")]
    BelowMinimumStake {
        minimum: TokenAmount,
        amount: TokenAmount,
    },

    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("unknown staking position {0}")]
    UnknownPosition(PositionId),

    #[error("tokens are locked until {until}")]
    TokensLocked { until: Timestamp },

    #[error("stake amount must be greater than zero")]
    InvalidAmount,

    #[error("treasury cannot fund reward: need {needed}, available {available}")]
    InsufficientRewardFunds {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("invalid pool configuration: {0}")]
    InvalidPoolConfig(String),

    #[error("arithmetic overflow in staking computation")]
    Overflow,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
