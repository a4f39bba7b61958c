use gdao_types::{Address, TokenAmount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("invalid address: {0:?}")]
    InvalidAddress(Address),

    #[error("insufficient treasury: need {needed}, available {available}")]
    InsufficientTreasury {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("genesis allocations of {requested} exceed the {available} left after the treasury")]
    GenesisExceedsSupply {
        requested: TokenAmount,
        available: TokenAmount,
    },

    #[error("treasury share of {0} basis points exceeds 100%")]
    InvalidTreasuryShare(u32),

    #[error("hold {0} not found")]
    HoldNotFound(u64),

    #[error("staked total would drop below zero releasing {0}")]
    StakeUnderflow(TokenAmount),

    #[error("arithmetic overflow in ledger computation")]
    Overflow,

    #[error("conservation violated: expected {expected}, found {actual}")]
    ConservationViolated {
        expected: TokenAmount,
        actual: TokenAmount,
    },

    #[error("snapshot digest does not match its contents")]
    SnapshotCorrupted,

    #[error("storage error: {0}")]
    Storage(#[from] gdao_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
