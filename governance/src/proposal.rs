//! Governance proposals and their lifecycle.

use crate::payload::ExecutionPayload;
use gdao_types::{Address, Timestamp, TokenAmount, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential proposal identifier, starting at 1.
pub type ProposalId = u64;

/// Lifecycle status of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Created, voting window not yet open.
    Draft,
    /// Voting window open.
    Active,
    /// Window closed with quorum and approval met; awaiting execution.
    Succeeded,
    /// Window closed without quorum or approval.
    Defeated,
    /// Payload applied.
    Executed,
    /// Withdrawn by the proposer.
    Cancelled,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Succeeded => "succeeded",
            Self::Defeated => "defeated",
            Self::Executed => "executed",
            Self::Cancelled => "cancelled",
        }
    }

    /// No further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Defeated | Self::Executed | Self::Cancelled)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub created_at: Timestamp,
    /// Voting opens at `start_time` (inclusive).
    pub start_time: Timestamp,
    /// Voting closes at `end_time` (exclusive).
    pub end_time: Timestamp,
    /// Timelock after `end_time`, fixed at creation.
    pub execution_delay_secs: u64,
    pub status: ProposalStatus,
    /// Quorum fraction fixed at creation (basis points of total supply).
    pub quorum_bps: u32,
    pub votes_for: TokenAmount,
    pub votes_against: TokenAmount,
    pub votes_abstain: TokenAmount,
    pub payload: Option<ExecutionPayload>,
    pub executed_at: Option<Timestamp>,
    /// Set between `begin_execution` and its completion or abort.
    pub execution_pending: bool,
    /// Settlement transaction for an on-chain transfer payload.
    pub settlement_tx: Option<TransactionId>,
}

impl Proposal {
    /// Earliest time the proposal may be executed.
    pub fn execution_eta(&self) -> Timestamp {
        self.end_time.plus_secs(self.execution_delay_secs)
    }

    /// Sum of all three tallies.
    pub fn total_votes(&self) -> Option<TokenAmount> {
        TokenAmount::checked_sum([self.votes_for, self.votes_against, self.votes_abstain])
    }
}
