//! Line-oriented JSON command surface.
//!
//! Every command is one JSON object tagged by `op`, e.g.
//! `{"op": "cast_vote", "voter": "bob", "proposal_id": 1, "choice": "for"}`.
//! The reply is `{"ok": true, "result": ...}` or `{"ok": false, "error": "..."}`
//! with the domain error message verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use gdao_governance::{ExecutionPayload, ProposalId, VoteChoice};
use gdao_staking::{PoolId, PositionId};
use gdao_types::{Address, Clock, Settlement, TokenAmount};

use crate::node::DaoNode;
use crate::NodeError;

/// One inbound request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Transfer {
        from: Address,
        to: Address,
        amount: TokenAmount,
    },
    GrantFromTreasury {
        to: Address,
        amount: TokenAmount,
    },
    Stake {
        user: Address,
        pool_id: PoolId,
        amount: TokenAmount,
    },
    Unstake {
        user: Address,
        position_id: PositionId,
    },
    ClaimRewards {
        user: Address,
        position_id: PositionId,
    },
    CreateProposal {
        proposer: Address,
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        payload: Option<ExecutionPayload>,
    },
    CastVote {
        voter: Address,
        proposal_id: ProposalId,
        choice: VoteChoice,
    },
    CancelProposal {
        caller: Address,
        proposal_id: ProposalId,
    },
    ExecuteProposal {
        proposal_id: ProposalId,
    },
    Balance {
        address: Address,
    },
    TokenInfo,
    Proposal {
        proposal_id: ProposalId,
    },
    ProposalResult {
        proposal_id: ProposalId,
    },
    Proposals,
    Votes {
        proposal_id: ProposalId,
    },
    VotingPower {
        voter: Address,
    },
    Positions {
        user: Address,
    },
    PendingRewards {
        position_id: PositionId,
    },
    PoolStats,
    GovernanceParams,
    Sweep,
    Audit,
    Metrics,
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, NodeError> {
        serde_json::from_str(line).map_err(|e| NodeError::InvalidCommand(e.to_string()))
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, NodeError> {
    serde_json::to_value(value).map_err(|e| NodeError::InvalidCommand(e.to_string()))
}

/// Wrap an outcome in the reply envelope.
pub fn reply(outcome: Result<Value, NodeError>) -> Value {
    match outcome {
        Ok(result) => json!({ "ok": true, "result": result }),
        Err(e) => json!({ "ok": false, "error": e.to_string() }),
    }
}

impl<S, C> DaoNode<S, C>
where
    S: Settlement + 'static,
    C: Clock + 'static,
{
    /// Run one command against the node.
    pub async fn dispatch(&self, command: Command) -> Result<Value, NodeError> {
        match command {
            Command::Transfer { from, to, amount } => {
                self.transfer(&from, &to, amount).await?;
                to_value(json!({ "from": from, "to": to, "amount": amount }))
            }
            Command::GrantFromTreasury { to, amount } => {
                self.grant_from_treasury(&to, amount).await?;
                let treasury = self.treasury_balance().await;
                to_value(json!({ "to": to, "amount": amount, "treasury": treasury }))
            }
            Command::Stake {
                user,
                pool_id,
                amount,
            } => to_value(self.stake(&user, pool_id, amount).await?),
            Command::Unstake { user, position_id } => {
                let (principal, reward) = self.unstake(&user, position_id).await?;
                to_value(json!({ "principal": principal, "reward": reward }))
            }
            Command::ClaimRewards { user, position_id } => {
                let amount = self.claim_rewards(&user, position_id).await?;
                to_value(json!({ "claimed": amount }))
            }
            Command::CreateProposal {
                proposer,
                title,
                description,
                payload,
            } => to_value(
                self.create_proposal(&proposer, &title, &description, payload)
                    .await?,
            ),
            Command::CastVote {
                voter,
                proposal_id,
                choice,
            } => to_value(self.cast_vote(&voter, proposal_id, choice).await?),
            Command::CancelProposal {
                caller,
                proposal_id,
            } => to_value(self.cancel_proposal(proposal_id, &caller).await?),
            Command::ExecuteProposal { proposal_id } => {
                to_value(self.execute_proposal(proposal_id).await?)
            }
            Command::Balance { address } => {
                let balance = self.balance_of(&address).await;
                to_value(json!({ "address": address, "balance": balance }))
            }
            Command::TokenInfo => to_value(self.token_info().await),
            Command::Proposal { proposal_id } => to_value(self.proposal(proposal_id).await?),
            Command::ProposalResult { proposal_id } => {
                to_value(self.proposal_result(proposal_id).await?)
            }
            Command::Proposals => to_value(self.proposals().await?),
            Command::Votes { proposal_id } => to_value(self.votes(proposal_id).await),
            Command::VotingPower { voter } => {
                let power = self.voting_power(&voter).await;
                to_value(json!({ "voter": voter, "power": power }))
            }
            Command::Positions { user } => to_value(self.positions_of(&user).await?),
            Command::PendingRewards { position_id } => {
                let pending = self.pending_rewards(position_id).await?;
                to_value(json!({ "position_id": position_id, "pending": pending }))
            }
            Command::PoolStats => to_value(self.pool_stats().await?),
            Command::GovernanceParams => to_value(self.governance_params().await),
            Command::Sweep => {
                let transitions = self.sweep().await?;
                to_value(json!({ "transitions": transitions }))
            }
            Command::Audit => {
                self.audit().await?;
                to_value(json!({ "conserved": true }))
            }
            Command::Metrics => {
                if !self.config().enable_metrics {
                    return Err(NodeError::Config("metrics are disabled".to_string()));
                }
                to_value(self.metrics().encode()?)
            }
        }
    }
}
