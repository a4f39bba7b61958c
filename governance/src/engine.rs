//! Core governance engine: proposals, votes and lazy lifecycle resolution.

use crate::error::GovernanceError;
use crate::payload::ExecutionPayload;
use crate::proposal::{Proposal, ProposalId, ProposalStatus};
use crate::result::{self, ProposalResult};
use crate::vote::{Vote, VoteChoice};
use gdao_ledger::Ledger;
use gdao_store::{GovernanceStore, MetaStore};
use gdao_types::{Address, GovernanceParams, Timestamp, TokenAmount, TransactionId};
use std::collections::{BTreeMap, HashMap, HashSet};

const META_PARAMS: &str = "governance_params";
const META_NEXT_PROPOSAL_ID: &str = "governance_next_proposal_id";

/// A lifecycle transition, recorded so callers can publish it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub proposal_id: ProposalId,
    pub from: ProposalStatus,
    pub to: ProposalStatus,
    pub at: Timestamp,
}

/// Proof that a proposal passed every execution check and is reserved for
/// this caller. Consumed by [`GovernanceEngine::complete_execution`] or
/// [`GovernanceEngine::abort_execution`].
#[derive(Debug)]
#[must_use = "an execution ticket must be completed or aborted"]
pub struct ExecutionTicket {
    proposal_id: ProposalId,
    payload: Option<ExecutionPayload>,
}

impl ExecutionTicket {
    pub fn proposal_id(&self) -> ProposalId {
        self.proposal_id
    }

    pub fn payload(&self) -> Option<&ExecutionPayload> {
        self.payload.as_ref()
    }
}

/// The governance engine.
///
/// Owns every proposal and vote. Status is never advanced by a timer: each
/// entry point first resolves the proposal it touches against `now`, so a
/// proposal whose window closed unobserved stays `Active` until the next call.
#[derive(Clone, Debug)]
pub struct GovernanceEngine {
    params: GovernanceParams,
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: HashMap<ProposalId, Vec<Vote>>,
    voted: HashSet<(ProposalId, Address)>,
    next_proposal_id: ProposalId,
    changes: Vec<StatusChange>,
}

impl GovernanceEngine {
    pub fn new(params: GovernanceParams) -> Result<Self, GovernanceError> {
        if !params.is_valid() {
            return Err(GovernanceError::InvalidParams(format!(
                "quorum {} bps / approval {} bps out of range",
                params.quorum_bps, params.approval_threshold_bps
            )));
        }
        Ok(Self {
            params,
            proposals: BTreeMap::new(),
            votes: HashMap::new(),
            voted: HashSet::new(),
            next_proposal_id: 1,
            changes: Vec::new(),
        })
    }

    /// Current governance policy.
    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    /// All proposals as last resolved, ordered by id. Call [`Self::sweep`]
    /// first for up-to-date statuses.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Votes cast on a proposal, in casting order. Empty for unknown ids.
    pub fn votes(&self, proposal_id: ProposalId) -> &[Vote] {
        self.votes.get(&proposal_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Weight a vote cast by `voter` right now would carry.
    pub fn voting_power(&self, ledger: &Ledger, voter: &Address) -> TokenAmount {
        ledger.balance_of(voter)
    }

    /// Drain the transitions recorded since the last call.
    pub fn take_status_changes(&mut self) -> Vec<StatusChange> {
        std::mem::take(&mut self.changes)
    }

    /// Open a new proposal. The proposer's balance must reach
    /// `min_proposal_power`.
    pub fn create_proposal(
        &mut self,
        ledger: &Ledger,
        proposer: &Address,
        title: impl Into<String>,
        description: impl Into<String>,
        payload: Option<ExecutionPayload>,
        now: Timestamp,
    ) -> Result<Proposal, GovernanceError> {
        let available = ledger.balance_of(proposer);
        if available < self.params.min_proposal_power {
            return Err(GovernanceError::InsufficientProposalPower {
                required: self.params.min_proposal_power,
                available,
            });
        }
        let next_proposal_id = self
            .next_proposal_id
            .checked_add(1)
            .ok_or(GovernanceError::Overflow)?;
        let start_time = now.plus_secs(self.params.voting_delay_secs);
        let proposal = Proposal {
            id: self.next_proposal_id,
            title: title.into(),
            description: description.into(),
            proposer: proposer.clone(),
            created_at: now,
            start_time,
            end_time: start_time.plus_secs(self.params.voting_period_secs),
            execution_delay_secs: self.params.execution_delay_secs,
            status: ProposalStatus::Draft,
            quorum_bps: self.params.quorum_bps,
            votes_for: TokenAmount::ZERO,
            votes_against: TokenAmount::ZERO,
            votes_abstain: TokenAmount::ZERO,
            payload,
            executed_at: None,
            execution_pending: false,
            settlement_tx: None,
        };
        self.proposals.insert(proposal.id, proposal.clone());
        self.next_proposal_id = next_proposal_id;
        tracing::debug!(
            proposal = proposal.id,
            %proposer,
            start = %proposal.start_time,
            end = %proposal.end_time,
            "proposal created"
        );
        Ok(proposal)
    }

    /// Record a vote weighted by the voter's current balance.
    pub fn cast_vote(
        &mut self,
        ledger: &Ledger,
        voter: &Address,
        proposal_id: ProposalId,
        choice: VoteChoice,
        now: Timestamp,
    ) -> Result<Vote, GovernanceError> {
        let status = self.resolve(proposal_id, ledger, now)?;
        let proposal = self
            .proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        match status {
            ProposalStatus::Draft => {
                return Err(GovernanceError::VotingNotStarted {
                    starts_at: proposal.start_time,
                })
            }
            ProposalStatus::Active => {}
            ProposalStatus::Cancelled => {
                return Err(GovernanceError::ProposalCancelled(proposal_id))
            }
            _ => return Err(GovernanceError::VotingEnded),
        }
        if self.voted.contains(&(proposal_id, voter.clone())) {
            return Err(GovernanceError::AlreadyVoted {
                voter: voter.clone(),
                proposal_id,
            });
        }

        let power = self.voting_power(ledger, voter);
        let (votes_for, votes_against, votes_abstain) = match choice {
            VoteChoice::For => (
                proposal.votes_for.checked_add(power).ok_or(GovernanceError::Overflow)?,
                proposal.votes_against,
                proposal.votes_abstain,
            ),
            VoteChoice::Against => (
                proposal.votes_for,
                proposal.votes_against.checked_add(power).ok_or(GovernanceError::Overflow)?,
                proposal.votes_abstain,
            ),
            VoteChoice::Abstain => (
                proposal.votes_for,
                proposal.votes_against,
                proposal.votes_abstain.checked_add(power).ok_or(GovernanceError::Overflow)?,
            ),
        };

        let vote = Vote {
            voter: voter.clone(),
            proposal_id,
            choice,
            power,
            cast_at: now,
        };
        if let Some(proposal) = self.proposals.get_mut(&proposal_id) {
            proposal.votes_for = votes_for;
            proposal.votes_against = votes_against;
            proposal.votes_abstain = votes_abstain;
        }
        self.voted.insert((proposal_id, voter.clone()));
        self.votes.entry(proposal_id).or_default().push(vote.clone());
        tracing::debug!(proposal = proposal_id, %voter, %choice, %power, "vote recorded");

        self.resolve(proposal_id, ledger, now)?;
        Ok(vote)
    }

    /// Apply every transition that is due at `now` and return the resulting status.
    pub fn resolve(
        &mut self,
        proposal_id: ProposalId,
        ledger: &Ledger,
        now: Timestamp,
    ) -> Result<ProposalStatus, GovernanceError> {
        let threshold_bps = self.params.approval_threshold_bps;
        let supply = ledger.total_supply();
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        advance(proposal, threshold_bps, supply, now, &mut self.changes)?;
        Ok(proposal.status)
    }

    /// Resolve every proposal that is not yet final. Returns the number of
    /// transitions applied.
    pub fn sweep(&mut self, ledger: &Ledger, now: Timestamp) -> Result<usize, GovernanceError> {
        let threshold_bps = self.params.approval_threshold_bps;
        let supply = ledger.total_supply();
        let before = self.changes.len();
        for proposal in self.proposals.values_mut() {
            if !proposal.status.is_terminal() {
                advance(proposal, threshold_bps, supply, now, &mut self.changes)?;
            }
        }
        Ok(self.changes.len() - before)
    }

    /// A resolved copy of one proposal.
    pub fn proposal(
        &mut self,
        proposal_id: ProposalId,
        ledger: &Ledger,
        now: Timestamp,
    ) -> Result<Proposal, GovernanceError> {
        self.resolve(proposal_id, ledger, now)?;
        self.proposals
            .get(&proposal_id)
            .cloned()
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))
    }

    /// Participation, approval and quorum figures from the current tallies.
    pub fn proposal_result(
        &mut self,
        proposal_id: ProposalId,
        ledger: &Ledger,
        now: Timestamp,
    ) -> Result<ProposalResult, GovernanceError> {
        let proposal = self.proposal(proposal_id, ledger, now)?;
        let supply = ledger.total_supply();
        let total = proposal.total_votes().ok_or(GovernanceError::Overflow)?;
        let decisive = proposal
            .votes_for
            .checked_add(proposal.votes_against)
            .ok_or(GovernanceError::Overflow)?;
        Ok(ProposalResult {
            proposal_id,
            status: proposal.status,
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
            votes_abstain: proposal.votes_abstain,
            total_supply: supply,
            participation_bps: TokenAmount::ratio_bps(total, supply),
            approval_bps: TokenAmount::ratio_bps(proposal.votes_for, decisive),
            quorum_reached: result::quorum_reached(total, supply, proposal.quorum_bps)
                .ok_or(GovernanceError::Overflow)?,
            approval_reached: result::approval_reached(
                proposal.votes_for,
                proposal.votes_against,
                self.params.approval_threshold_bps,
            )
            .ok_or(GovernanceError::Overflow)?,
        })
    }

    /// Withdraw a proposal. Only its proposer may cancel, and only while it
    /// is not final.
    pub fn cancel_proposal(
        &mut self,
        proposal_id: ProposalId,
        caller: &Address,
        ledger: &Ledger,
        now: Timestamp,
    ) -> Result<Proposal, GovernanceError> {
        let status = self.resolve(proposal_id, ledger, now)?;
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if &proposal.proposer != caller {
            return Err(GovernanceError::NotProposer);
        }
        if status.is_terminal() {
            return Err(GovernanceError::ProposalFinalized(proposal_id));
        }
        if proposal.execution_pending {
            return Err(GovernanceError::ExecutionInProgress(proposal_id));
        }
        proposal.status = ProposalStatus::Cancelled;
        self.changes.push(StatusChange {
            proposal_id,
            from: status,
            to: ProposalStatus::Cancelled,
            at: now,
        });
        tracing::debug!(proposal = proposal_id, from = %status, "proposal cancelled");
        Ok(proposal.clone())
    }

    /// First phase of execution: check status, timelock and payload, then
    /// reserve the proposal so no concurrent attempt can execute it too.
    pub fn begin_execution(
        &mut self,
        proposal_id: ProposalId,
        ledger: &Ledger,
        now: Timestamp,
    ) -> Result<ExecutionTicket, GovernanceError> {
        let status = self.resolve(proposal_id, ledger, now)?;
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if status != ProposalStatus::Succeeded {
            return Err(GovernanceError::NotSucceeded(status));
        }
        if proposal.execution_pending {
            return Err(GovernanceError::ExecutionInProgress(proposal_id));
        }
        let eta = proposal.execution_eta();
        if now < eta {
            return Err(GovernanceError::TimelockNotElapsed { eta });
        }
        if let Some(payload) = &proposal.payload {
            payload.check_executable()?;
        }
        proposal.execution_pending = true;
        Ok(ExecutionTicket {
            proposal_id,
            payload: proposal.payload.clone(),
        })
    }

    /// Final phase of execution: apply any parameter change and mark the
    /// proposal executed. A failed parameter change releases the reservation
    /// and leaves the proposal `Succeeded`.
    pub fn complete_execution(
        &mut self,
        ticket: ExecutionTicket,
        settlement_tx: Option<TransactionId>,
        now: Timestamp,
    ) -> Result<Proposal, GovernanceError> {
        let proposal_id = ticket.proposal_id;
        let change = match &ticket.payload {
            Some(ExecutionPayload::ParameterChange { parameter, value }) => {
                Some((*parameter, *value))
            }
            _ => None,
        };
        if let Some((parameter, value)) = change {
            let mut params = self.params.clone();
            if let Err(err) = parameter.apply(&mut params, value) {
                self.abort_execution(ticket);
                return Err(err);
            }
            tracing::info!(%parameter, value, "governance parameter changed");
            self.params = params;
        }
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        proposal.execution_pending = false;
        proposal.status = ProposalStatus::Executed;
        proposal.executed_at = Some(now);
        proposal.settlement_tx = settlement_tx;
        self.changes.push(StatusChange {
            proposal_id,
            from: ProposalStatus::Succeeded,
            to: ProposalStatus::Executed,
            at: now,
        });
        Ok(proposal.clone())
    }

    /// Release a reservation without executing; the proposal stays `Succeeded`.
    pub fn abort_execution(&mut self, ticket: ExecutionTicket) {
        if let Some(proposal) = self.proposals.get_mut(&ticket.proposal_id) {
            proposal.execution_pending = false;
        }
        tracing::debug!(proposal = ticket.proposal_id, "execution aborted");
    }

    /// Clear reservations left by executions that never reported back, e.g.
    /// after a restart. The affected proposals stay `Succeeded`.
    pub fn clear_pending_executions(&mut self) -> Vec<ProposalId> {
        let mut cleared = Vec::new();
        for proposal in self.proposals.values_mut() {
            if proposal.execution_pending {
                proposal.execution_pending = false;
                cleared.push(proposal.id);
            }
        }
        cleared
    }

    /// Execute a proposal entirely in-process: a transfer payload moves
    /// balances directly on `ledger`.
    pub fn execute_proposal(
        &mut self,
        ledger: &mut Ledger,
        proposal_id: ProposalId,
        now: Timestamp,
    ) -> Result<Proposal, GovernanceError> {
        let ticket = self.begin_execution(proposal_id, ledger, now)?;
        let transferred = match &ticket.payload {
            Some(ExecutionPayload::Transfer {
                from_address,
                to_address,
                amount,
            }) => ledger.transfer(from_address, to_address, *amount),
            _ => Ok(()),
        };
        if let Err(err) = transferred {
            self.abort_execution(ticket);
            return Err(err.into());
        }
        self.complete_execution(ticket, None, now)
    }
}

/// Step a proposal through every transition due at `now`.
fn advance(
    proposal: &mut Proposal,
    threshold_bps: u32,
    supply: TokenAmount,
    now: Timestamp,
    changes: &mut Vec<StatusChange>,
) -> Result<(), GovernanceError> {
    loop {
        let next = match proposal.status {
            ProposalStatus::Draft if now >= proposal.start_time => ProposalStatus::Active,
            ProposalStatus::Active if now >= proposal.end_time => result::outcome(
                proposal.votes_for,
                proposal.votes_against,
                proposal.votes_abstain,
                supply,
                proposal.quorum_bps,
                threshold_bps,
            )
            .ok_or(GovernanceError::Overflow)?,
            _ => return Ok(()),
        };
        tracing::debug!(
            proposal = proposal.id,
            from = %proposal.status,
            to = %next,
            "proposal resolved"
        );
        changes.push(StatusChange {
            proposal_id: proposal.id,
            from: proposal.status,
            to: next,
            at: now,
        });
        proposal.status = next;
    }
}

impl GovernanceEngine {
    /// Persist policy, proposals and votes.
    ///
    /// Votes are append-only: only votes the store does not hold yet are written.
    pub fn save_to_store<S>(&self, store: &S) -> Result<(), GovernanceError>
    where
        S: GovernanceStore + MetaStore + ?Sized,
    {
        let params = bincode::serialize(&self.params)
            .map_err(|e| GovernanceError::Serialization(e.to_string()))?;
        store.put_meta(META_PARAMS, &params)?;
        store.put_meta(META_NEXT_PROPOSAL_ID, &self.next_proposal_id.to_be_bytes())?;

        for (id, proposal) in &self.proposals {
            let bytes = bincode::serialize(proposal)
                .map_err(|e| GovernanceError::Serialization(e.to_string()))?;
            store.put_proposal(*id, &bytes)?;
        }
        for (id, votes) in &self.votes {
            for vote in votes {
                if store.has_vote(*id, &vote.voter)? {
                    continue;
                }
                let bytes = bincode::serialize(vote)
                    .map_err(|e| GovernanceError::Serialization(e.to_string()))?;
                store.put_vote(*id, &vote.voter, &bytes)?;
            }
        }
        Ok(())
    }

    /// Restore engine state from a store. `None` when no policy was saved.
    pub fn load_from_store<S>(store: &S) -> Result<Option<Self>, GovernanceError>
    where
        S: GovernanceStore + MetaStore + ?Sized,
    {
        let params: GovernanceParams = match store.get_meta(META_PARAMS)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| GovernanceError::Serialization(e.to_string()))?,
            None => return Ok(None),
        };
        let mut engine = Self::new(params)?;

        for (id, bytes) in store.iter_proposals()? {
            let proposal: Proposal = bincode::deserialize(&bytes)
                .map_err(|e| GovernanceError::Serialization(e.to_string()))?;
            for vote_bytes in store.get_votes(id)? {
                let vote: Vote = bincode::deserialize(&vote_bytes)
                    .map_err(|e| GovernanceError::Serialization(e.to_string()))?;
                engine.voted.insert((id, vote.voter.clone()));
                engine.votes.entry(id).or_default().push(vote);
            }
            engine.proposals.insert(id, proposal);
        }
        engine.next_proposal_id = match store.get_meta(META_NEXT_PROPOSAL_ID)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    GovernanceError::Serialization("malformed next proposal id".to_string())
                })?;
                u64::from_be_bytes(raw)
            }
            None => engine.proposals.keys().next_back().map_or(1, |id| id + 1),
        };
        Ok(Some(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GovernableParam;
    use gdao_ledger::GenesisConfig;
    use gdao_nullables::NullStore;
    use gdao_types::TokenParams;

    const DELAY: u64 = 100;
    const PERIOD: u64 = 1000;
    const TIMELOCK: u64 = 500;

    fn tokens(n: u64) -> TokenAmount {
        TokenAmount::from_tokens(n)
    }

    fn addr(name: &str) -> Address {
        Address::new(name)
    }

    fn params() -> GovernanceParams {
        GovernanceParams {
            min_proposal_power: tokens(100),
            voting_delay_secs: DELAY,
            voting_period_secs: PERIOD,
            execution_delay_secs: TIMELOCK,
            quorum_bps: 400,
            approval_threshold_bps: 5000,
        }
    }

    /// Total supply 1000, no treasury, so participation maps directly to tokens.
    fn ledger() -> Ledger {
        let token = TokenParams {
            total_supply: tokens(1000),
            treasury_bps: 0,
            ..TokenParams::default()
        };
        let config = GenesisConfig::new(token)
            .with_allocation("alice", tokens(200))
            .with_allocation("bob", tokens(60))
            .with_allocation("carol", tokens(40))
            .with_allocation("dave", tokens(10));
        Ledger::genesis(&config).unwrap()
    }

    fn engine_with_proposal(
        ledger: &Ledger,
        payload: Option<ExecutionPayload>,
    ) -> (GovernanceEngine, ProposalId) {
        let mut engine = GovernanceEngine::new(params()).unwrap();
        let proposal = engine
            .create_proposal(
                ledger,
                &addr("alice"),
                "Fund docs",
                "Pay the writers",
                payload,
                Timestamp::new(0),
            )
            .unwrap();
        (engine, proposal.id)
    }

    #[test]
    fn proposal_requires_minimum_power() {
        let ledger = ledger();
        let mut engine = GovernanceEngine::new(params()).unwrap();
        let err = engine
            .create_proposal(&ledger, &addr("bob"), "t", "d", None, Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InsufficientProposalPower { .. }));
        assert_eq!(engine.proposal_count(), 0);
    }

    #[test]
    fn proposal_times_follow_policy() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        let proposal = engine.proposal(id, &ledger, Timestamp::new(0)).unwrap();
        assert_eq!(proposal.id, 1);
        assert_eq!(proposal.status, ProposalStatus::Draft);
        assert_eq!(proposal.start_time, Timestamp::new(DELAY));
        assert_eq!(proposal.end_time, Timestamp::new(DELAY + PERIOD));
        assert_eq!(proposal.execution_eta(), Timestamp::new(DELAY + PERIOD + TIMELOCK));
    }

    #[test]
    fn vote_before_start_is_rejected() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        assert!(matches!(
            engine.cast_vote(&ledger, &addr("bob"), id, VoteChoice::For, Timestamp::new(DELAY - 1)),
            Err(GovernanceError::VotingNotStarted { .. })
        ));
    }

    #[test]
    fn second_vote_is_rejected() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        let at = Timestamp::new(DELAY);
        engine.cast_vote(&ledger, &addr("bob"), id, VoteChoice::For, at).unwrap();
        assert!(matches!(
            engine.cast_vote(&ledger, &addr("bob"), id, VoteChoice::Against, at),
            Err(GovernanceError::AlreadyVoted { .. })
        ));
        assert_eq!(engine.votes(id).len(), 1);
        let proposal = engine.proposal(id, &ledger, at).unwrap();
        assert_eq!(proposal.votes_for, tokens(60));
        assert_eq!(proposal.votes_against, TokenAmount::ZERO);
    }

    #[test]
    fn vote_at_end_time_is_rejected_even_without_prior_read() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        assert!(matches!(
            engine.cast_vote(
                &ledger,
                &addr("bob"),
                id,
                VoteChoice::For,
                Timestamp::new(DELAY + PERIOD)
            ),
            Err(GovernanceError::VotingEnded)
        ));
    }

    #[test]
    fn status_stays_active_until_touched() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        engine
            .cast_vote(&ledger, &addr("bob"), id, VoteChoice::For, Timestamp::new(DELAY))
            .unwrap();
        assert_eq!(engine.proposals().next().unwrap().status, ProposalStatus::Active);
        assert_eq!(
            engine.resolve(id, &ledger, Timestamp::new(DELAY + PERIOD)).unwrap(),
            ProposalStatus::Succeeded
        );
    }

    #[test]
    fn untouched_draft_resolves_straight_to_outcome() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        engine.take_status_changes();
        let status = engine.resolve(id, &ledger, Timestamp::new(10_000)).unwrap();
        assert_eq!(status, ProposalStatus::Defeated);
        let changes = engine.take_status_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].to, ProposalStatus::Active);
        assert_eq!(changes[1].to, ProposalStatus::Defeated);
    }

    #[test]
    fn sixty_forty_on_a_thousand_supply_succeeds() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        let at = Timestamp::new(DELAY);
        engine.cast_vote(&ledger, &addr("bob"), id, VoteChoice::For, at).unwrap();
        engine.cast_vote(&ledger, &addr("carol"), id, VoteChoice::Against, at).unwrap();

        let result = engine
            .proposal_result(id, &ledger, Timestamp::new(DELAY + PERIOD))
            .unwrap();
        assert_eq!(result.status, ProposalStatus::Succeeded);
        assert_eq!(result.participation_bps, 1000);
        assert_eq!(result.approval_bps, 6000);
        assert!(result.quorum_reached);
    }

    #[test]
    fn below_quorum_is_defeated() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        engine
            .cast_vote(&ledger, &addr("dave"), id, VoteChoice::For, Timestamp::new(DELAY))
            .unwrap();
        let result = engine
            .proposal_result(id, &ledger, Timestamp::new(DELAY + PERIOD))
            .unwrap();
        assert_eq!(result.status, ProposalStatus::Defeated);
        assert!(!result.quorum_reached);
        assert_eq!(result.approval_bps, 10_000);
    }

    fn passed(payload: Option<ExecutionPayload>) -> (Ledger, GovernanceEngine, ProposalId) {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, payload);
        engine
            .cast_vote(&ledger, &addr("bob"), id, VoteChoice::For, Timestamp::new(DELAY))
            .unwrap();
        (ledger, engine, id)
    }

    #[test]
    fn execution_waits_for_timelock() {
        let (mut ledger, mut engine, id) = passed(None);
        let eta = DELAY + PERIOD + TIMELOCK;
        assert!(matches!(
            engine.execute_proposal(&mut ledger, id, Timestamp::new(eta - 1)),
            Err(GovernanceError::TimelockNotElapsed { .. })
        ));
        let executed = engine.execute_proposal(&mut ledger, id, Timestamp::new(eta)).unwrap();
        assert_eq!(executed.status, ProposalStatus::Executed);
        assert_eq!(executed.executed_at, Some(Timestamp::new(eta)));
        assert!(matches!(
            engine.execute_proposal(&mut ledger, id, Timestamp::new(eta)),
            Err(GovernanceError::NotSucceeded(ProposalStatus::Executed))
        ));
    }

    #[test]
    fn transfer_payload_moves_balances() {
        let payload = ExecutionPayload::Transfer {
            from_address: addr("alice"),
            to_address: addr("erin"),
            amount: tokens(50),
        };
        let (mut ledger, mut engine, id) = passed(Some(payload));
        engine
            .execute_proposal(&mut ledger, id, Timestamp::new(DELAY + PERIOD + TIMELOCK))
            .unwrap();
        assert_eq!(ledger.balance_of(&addr("erin")), tokens(50));
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(150));
    }

    #[test]
    fn failed_transfer_leaves_proposal_succeeded() {
        let payload = ExecutionPayload::Transfer {
            from_address: addr("dave"),
            to_address: addr("erin"),
            amount: tokens(11),
        };
        let (mut ledger, mut engine, id) = passed(Some(payload));
        let at = Timestamp::new(DELAY + PERIOD + TIMELOCK);
        assert!(matches!(
            engine.execute_proposal(&mut ledger, id, at),
            Err(GovernanceError::Ledger(_))
        ));
        let proposal = engine.proposal(id, &ledger, at).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Succeeded);
        assert!(!proposal.execution_pending);
    }

    #[test]
    fn pending_execution_can_be_cleared() {
        let (ledger, mut engine, id) = passed(None);
        let at = Timestamp::new(DELAY + PERIOD + TIMELOCK);
        let ticket = engine.begin_execution(id, &ledger, at).unwrap();
        assert_eq!(ticket.proposal_id(), id);
        std::mem::forget(ticket);
        assert_eq!(engine.clear_pending_executions(), vec![id]);
        assert!(engine.clear_pending_executions().is_empty());
        let ticket = engine.begin_execution(id, &ledger, at).unwrap();
        let proposal = engine.complete_execution(ticket, None, at).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Executed);
    }

    #[test]
    fn parameter_change_updates_policy() {
        let payload = ExecutionPayload::ParameterChange {
            parameter: GovernableParam::VotingPeriodSecs,
            value: 42,
        };
        let (mut ledger, mut engine, id) = passed(Some(payload));
        engine
            .execute_proposal(&mut ledger, id, Timestamp::new(DELAY + PERIOD + TIMELOCK))
            .unwrap();
        assert_eq!(engine.params().voting_period_secs, 42);
    }

    #[test]
    fn unrecognized_payload_fails_at_execution() {
        let payload = ExecutionPayload::Unrecognized {
            kind: "airdrop".to_string(),
        };
        let (mut ledger, mut engine, id) = passed(Some(payload));
        let at = Timestamp::new(DELAY + PERIOD + TIMELOCK);
        assert!(matches!(
            engine.execute_proposal(&mut ledger, id, at),
            Err(GovernanceError::UnknownPayloadType(_))
        ));
        assert_eq!(engine.proposal(id, &ledger, at).unwrap().status, ProposalStatus::Succeeded);
    }

    #[test]
    fn concurrent_execution_is_refused() {
        let (ledger, mut engine, id) = passed(None);
        let at = Timestamp::new(DELAY + PERIOD + TIMELOCK);
        let ticket = engine.begin_execution(id, &ledger, at).unwrap();
        assert!(matches!(
            engine.begin_execution(id, &ledger, at),
            Err(GovernanceError::ExecutionInProgress(_))
        ));
        engine.abort_execution(ticket);
        let ticket = engine.begin_execution(id, &ledger, at).unwrap();
        engine.complete_execution(ticket, None, at).unwrap();
    }

    #[test]
    fn only_proposer_can_cancel_and_only_before_final() {
        let ledger = ledger();
        let (mut engine, id) = engine_with_proposal(&ledger, None);
        assert!(matches!(
            engine.cancel_proposal(id, &addr("bob"), &ledger, Timestamp::new(1)),
            Err(GovernanceError::NotProposer)
        ));
        let cancelled = engine
            .cancel_proposal(id, &addr("alice"), &ledger, Timestamp::new(1))
            .unwrap();
        assert_eq!(cancelled.status, ProposalStatus::Cancelled);
        assert!(matches!(
            engine.cast_vote(&ledger, &addr("bob"), id, VoteChoice::For, Timestamp::new(DELAY)),
            Err(GovernanceError::ProposalCancelled(_))
        ));
        assert!(matches!(
            engine.cancel_proposal(id, &addr("alice"), &ledger, Timestamp::new(2)),
            Err(GovernanceError::ProposalFinalized(_))
        ));
    }

    #[test]
    fn sweep_resolves_everything_due() {
        let ledger = ledger();
        let (mut engine, _) = engine_with_proposal(&ledger, None);
        engine
            .create_proposal(&ledger, &addr("alice"), "second", "", None, Timestamp::new(0))
            .unwrap();
        assert_eq!(engine.sweep(&ledger, Timestamp::new(DELAY)).unwrap(), 2);
        assert!(engine.proposals().all(|p| p.status == ProposalStatus::Active));
        assert_eq!(engine.sweep(&ledger, Timestamp::new(DELAY)).unwrap(), 0);
    }

    #[test]
    fn store_round_trip_keeps_votes_and_one_vote_rule() {
        let store = NullStore::new();
        let (ledger, mut engine, id) = passed(None);
        engine.save_to_store(&store).unwrap();
        engine.save_to_store(&store).unwrap();

        let mut loaded = GovernanceEngine::load_from_store(&store).unwrap().expect("engine stored");
        assert_eq!(loaded.votes(id).len(), 1);
        assert_eq!(loaded.params(), engine.params());
        assert!(matches!(
            loaded.cast_vote(&ledger, &addr("bob"), id, VoteChoice::For, Timestamp::new(DELAY + 1)),
            Err(GovernanceError::AlreadyVoted { .. })
        ));
        let next = loaded
            .create_proposal(&ledger, &addr("alice"), "next", "", None, Timestamp::new(DELAY))
            .unwrap();
        assert_eq!(next.id, 2);
    }
}
