//! Pending settlement holds.
//!
//! A hold is the ledger side of a two-phase transfer: the amount leaves the
//! sender when the hold is placed, and either reaches the recipient on commit
//! or returns to the sender on release. While open, held value is counted
//! separately so conservation still balances.

use gdao_types::{Address, TokenAmount, Timestamp};
use serde::{Deserialize, Serialize};

/// Unique identifier for an open hold.
pub type HoldId = u64;

/// A transfer whose settlement has not been confirmed yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub id: HoldId,
    /// Caller reference, e.g. `"proposal-7"`.
    pub reference: String,
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
    pub placed_at: Timestamp,
}
