//! Tally arithmetic and the derived result view.
//!
//! All comparisons cross-multiply in `u128` so no fraction is ever rounded.

use crate::proposal::{ProposalId, ProposalStatus};
use gdao_types::{TokenAmount, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// Derived, read-only outcome of a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResult {
    pub proposal_id: ProposalId,
    pub status: ProposalStatus,
    pub votes_for: TokenAmount,
    pub votes_against: TokenAmount,
    pub votes_abstain: TokenAmount,
    pub total_supply: TokenAmount,
    /// Total votes as a share of total supply.
    pub participation_bps: u32,
    /// `for` as a share of `for + against`; zero when neither was cast.
    pub approval_bps: u32,
    pub quorum_reached: bool,
    pub approval_reached: bool,
}

/// `total_votes / supply >= quorum_bps / 10_000`. `None` on overflow.
pub fn quorum_reached(
    total_votes: TokenAmount,
    supply: TokenAmount,
    quorum_bps: u32,
) -> Option<bool> {
    let lhs = total_votes.raw().checked_mul(BPS_DENOMINATOR as u128)?;
    let rhs = supply.raw().checked_mul(quorum_bps as u128)?;
    Some(lhs >= rhs)
}

/// `for / (for + against) >= threshold_bps / 10_000`; false when no
/// for/against votes were cast. `None` on overflow.
pub fn approval_reached(
    votes_for: TokenAmount,
    votes_against: TokenAmount,
    threshold_bps: u32,
) -> Option<bool> {
    let decisive = votes_for.checked_add(votes_against)?;
    if decisive.is_zero() {
        return Some(false);
    }
    let lhs = votes_for.raw().checked_mul(BPS_DENOMINATOR as u128)?;
    let rhs = decisive.raw().checked_mul(threshold_bps as u128)?;
    Some(lhs >= rhs)
}

/// Final status for a proposal whose window has closed.
pub fn outcome(
    votes_for: TokenAmount,
    votes_against: TokenAmount,
    votes_abstain: TokenAmount,
    supply: TokenAmount,
    quorum_bps: u32,
    threshold_bps: u32,
) -> Option<ProposalStatus> {
    let total = TokenAmount::checked_sum([votes_for, votes_against, votes_abstain])?;
    if !quorum_reached(total, supply, quorum_bps)? {
        return Some(ProposalStatus::Defeated);
    }
    if approval_reached(votes_for, votes_against, threshold_bps)? {
        Some(ProposalStatus::Succeeded)
    } else {
        Some(ProposalStatus::Defeated)
    }
}
