//! Token-weighted governance for the GDAO core.
//!
//! Proposal lifecycle: Draft → Active → Succeeded | Defeated → Executed,
//! with Cancelled reachable from any non-terminal status.
//!
//! Key principle: status is derived lazily. Nothing moves a proposal forward
//! except a call that touches it; every entry point resolves the proposal
//! against `now` before doing anything else. Voting power is the voter's
//! ledger balance at the moment the vote is cast.

pub mod engine;
pub mod error;
pub mod params;
pub mod payload;
pub mod proposal;
pub mod result;
pub mod vote;

pub use engine::{ExecutionTicket, GovernanceEngine, StatusChange};
pub use error::GovernanceError;
pub use params::GovernableParam;
pub use payload::ExecutionPayload;
pub use proposal::{Proposal, ProposalId, ProposalStatus};
pub use result::ProposalResult;
pub use vote::{Vote, VoteChoice};
