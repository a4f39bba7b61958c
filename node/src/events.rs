//! Events emitted by the node after each accepted state change.

use std::sync::RwLock;

use gdao_governance::{ProposalId, ProposalStatus, VoteChoice};
use gdao_staking::{PoolId, PositionId};
use gdao_types::{Address, Timestamp, TokenAmount, TransactionId};
use serde::Serialize;

/// State changes observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DaoEvent {
    /// Balance moved between two accounts.
    Transferred {
        from: Address,
        to: Address,
        amount: TokenAmount,
    },
    /// The treasury paid out to an account.
    TreasuryGranted { to: Address, amount: TokenAmount },
    /// A staking position was opened.
    Staked {
        user: Address,
        position_id: PositionId,
        pool_id: PoolId,
        amount: TokenAmount,
    },
    /// A position was closed and its principal returned.
    Unstaked {
        user: Address,
        position_id: PositionId,
        principal: TokenAmount,
        reward: TokenAmount,
    },
    RewardsClaimed {
        user: Address,
        position_id: PositionId,
        amount: TokenAmount,
    },
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: Address,
        start_time: Timestamp,
        end_time: Timestamp,
    },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        choice: VoteChoice,
        power: TokenAmount,
    },
    /// A proposal moved to a new lifecycle status, including cancellation.
    ProposalStatusChanged {
        proposal_id: ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
        at: Timestamp,
    },
    /// A proposal's payload was applied. `settlement_tx` is set when a
    /// transfer was settled on chain.
    ProposalExecuted {
        proposal_id: ProposalId,
        settlement_tx: Option<TransactionId>,
    },
}

type Listener = Box<dyn Fn(&DaoEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline while the node holds its state lock; keep
/// handlers fast and never call back into the node from one.
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Listener) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    pub fn emit(&self, event: &DaoEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for listener in listeners.iter() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
