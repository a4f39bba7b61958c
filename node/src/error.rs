use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Ledger(#[from] gdao_ledger::LedgerError),

    #[error(transparent)]
    Staking(#[from] gdao_staking::StakingError),

    #[error(transparent)]
    Governance(#[from] gdao_governance::GovernanceError),

    #[error(transparent)]
    Store(#[from] gdao_store::StoreError),

    #[error(transparent)]
    Settlement(#[from] gdao_types::SettlementError),

    #[error("config error: {0}")]
    Config(String),

    #[error("store holds no ledger state")]
    NotInitialized,

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
