//! Outbound settlement capability.
//!
//! The core never talks to a custodial wallet or DEX itself. When a transfer
//! must be settled against a real chain it hands a [`SettlementRequest`] to a
//! [`Settlement`] implementation and only applies the local balance change
//! once a transaction id comes back.

use crate::{Address, TokenAmount};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// A transfer to be settled on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// Caller-side reference, e.g. `"proposal-7"`. Lets the collaborator
    /// deduplicate retried submissions.
    pub reference: String,
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
}

/// Identifier returned by the settlement collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("settlement rejected: {0}")]
    Rejected(String),

    #[error("settlement service unavailable: {0}")]
    Unavailable(String),

    #[error("settlement timed out after {0}s")]
    TimedOut(u64),
}

/// `submit_on_chain(payload) -> tx_id`.
pub trait Settlement: Send + Sync {
    fn submit_on_chain(
        &self,
        request: &SettlementRequest,
    ) -> impl Future<Output = Result<TransactionId, SettlementError>> + Send;
}
