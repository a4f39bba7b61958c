use crate::proposal::{ProposalId, ProposalStatus};
use gdao_ledger::LedgerError;
use gdao_store::StoreError;
use gdao_types::{Address, Timestamp, TokenAmount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("insufficient proposal power: need {required}, have {available}")]
    InsufficientProposalPower {
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("voting has not started yet (starts at {starts_at})")]
    VotingNotStarted { starts_at: Timestamp },

    #[error("voting has ended for this proposal")]
    VotingEnded,

    #[error("{voter} has already voted on proposal {proposal_id}")]
    AlreadyVoted {
        voter: Address,
        proposal_id: ProposalId,
    },

    #[error("proposal has not succeeded (status: {0})")]
    NotSucceeded(ProposalStatus),

    #[error("execution delay has not passed (executable at {eta})")]
    TimelockNotElapsed { eta: Timestamp },

    #[error("unknown payload type: {0}")]
    UnknownPayloadType(String),

    #[error("invalid execution payload: {0}")]
    InvalidPayload(String),

    #[error("invalid value {value} for parameter {parameter}")]
    InvalidParameterValue { parameter: &'static str, value: u128 },

    #[error("invalid governance parameters: {0}")]
    InvalidParams(String),

    #[error("proposal {0} was cancelled")]
    ProposalCancelled(ProposalId),

    #[error("only the proposer can cancel a proposal")]
    NotProposer,

    #[error("proposal {0} is already finalized")]
    ProposalFinalized(ProposalId),

    #[error("proposal {0} is already being executed")]
    ExecutionInProgress(ProposalId),

    #[error("arithmetic overflow in vote tally")]
    Overflow,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}
