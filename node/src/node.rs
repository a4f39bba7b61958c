//! The GDAO node: the single mutation surface over ledger, staking and
//! governance.
//!
//! All engine state lives behind one `tokio::sync::Mutex`. Every inbound
//! operation is exactly one lock acquisition, so two racing calls are always
//! serialized (two votes from the same voter yield one `AlreadyVoted`).
//! The only suspension point inside an operation is `submit_on_chain`, and
//! the lock is never held across it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::Instrument;

use gdao_governance::{
    ExecutionPayload, ExecutionTicket, GovernanceEngine, Proposal, ProposalId, ProposalResult,
    Vote, VoteChoice,
};
use gdao_ledger::{Hold, HoldId, Ledger, TokenInfo};
use gdao_staking::{PoolId, PositionId, PositionView, StakingEngine, StakingPosition, StakingStats};
use gdao_store::DaoStore;
use gdao_types::{
    Address, Clock, GovernanceParams, Settlement, SettlementError, SettlementRequest, SystemClock,
    Timestamp, TokenAmount,
};

use crate::config::NodeConfig;
use crate::events::{DaoEvent, EventBus};
use crate::metrics::DaoMetrics;
use crate::shutdown::ShutdownController;
use crate::tracing_spans;
use crate::NodeError;

/// Everything guarded by the node lock.
struct DaoState {
    ledger: Ledger,
    staking: StakingEngine,
    governance: GovernanceEngine,
}

/// A transfer execution waiting for the settlement collaborator.
struct PendingSettlement {
    ticket: ExecutionTicket,
    hold_id: HoldId,
    request: SettlementRequest,
}

enum Staged {
    Done(Proposal),
    Settle(PendingSettlement),
}

/// Rolls a pending settlement back if the executing future is dropped
/// before the outcome was applied.
struct SettlementGuard {
    state: Arc<Mutex<DaoState>>,
    metrics: Arc<DaoMetrics>,
    pending: Option<PendingSettlement>,
}

impl SettlementGuard {
    fn disarm(&mut self) -> Option<PendingSettlement> {
        self.pending.take()
    }
}

impl Drop for SettlementGuard {
    fn drop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.metrics.settlements_failed.inc();
        tracing::warn!(
            reference = %pending.request.reference,
            "settlement abandoned, releasing hold"
        );
        let state = Arc::clone(&self.state);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let mut state = state.lock().await;
                    roll_back(&mut state, pending.hold_id, pending.ticket);
                });
            }
            Err(_) => {
                let mut state = state.blocking_lock();
                roll_back(&mut state, pending.hold_id, pending.ticket);
            }
        }
    }
}

/// The GDAO node.
///
/// Generic over the settlement collaborator and the clock; tests plug in
/// nullable doubles for both.
pub struct DaoNode<S, C = SystemClock> {
    config: NodeConfig,
    state: Arc<Mutex<DaoState>>,
    settlement: Arc<S>,
    clock: Arc<C>,
    events: Arc<EventBus>,
    metrics: Arc<DaoMetrics>,
    shutdown: Arc<ShutdownController>,
    task_handles: Vec<JoinHandle<()>>,
}

impl<S, C> DaoNode<S, C>
where
    S: Settlement + 'static,
    C: Clock + 'static,
{
    /// Build a node from genesis: ledger allocations, pools and policy all
    /// come from `config`.
    pub fn new(config: NodeConfig, settlement: Arc<S>, clock: Arc<C>) -> Result<Self, NodeError> {
        config.validate()?;
        let ledger = Ledger::genesis(&config.genesis())?;
        let staking = StakingEngine::new(config.pools.clone(), config.reward_source)?;
        let governance = GovernanceEngine::new(config.governance_params())?;
        tracing::info!(
            environment = config.environment.as_str(),
            supply = %ledger.total_supply(),
            treasury = %ledger.treasury_balance(),
            accounts = ledger.account_count(),
            "node initialised from genesis"
        );
        Self::assemble(
            config,
            DaoState {
                ledger,
                staking,
                governance,
            },
            settlement,
            clock,
        )
    }

    /// Rebuild a node from a checkpoint.
    ///
    /// Transfers whose settlement never reported back are rolled back: the
    /// hold is refunded and the proposal stays `Succeeded`. Re-executing it
    /// resubmits under the same reference.
    pub fn restore<T>(
        config: NodeConfig,
        store: &T,
        settlement: Arc<S>,
        clock: Arc<C>,
    ) -> Result<Self, NodeError>
    where
        T: DaoStore + ?Sized,
    {
        config.validate()?;
        let mut ledger = Ledger::load_from_store(store)?.ok_or(NodeError::NotInitialized)?;
        let staking = match StakingEngine::load_from_store(store)? {
            Some(engine) => engine,
            None => StakingEngine::new(config.pools.clone(), config.reward_source)?,
        };
        let mut governance = match GovernanceEngine::load_from_store(store)? {
            Some(engine) => engine,
            None => GovernanceEngine::new(config.governance_params())?,
        };

        let stale: Vec<HoldId> = ledger.pending_holds().map(|hold| hold.id).collect();
        for id in stale {
            let hold = ledger.release_hold(id)?;
            tracing::warn!(hold = id, reference = %hold.reference, "released unsettled hold");
        }
        for id in governance.clear_pending_executions() {
            tracing::warn!(proposal = id, "cleared unfinished execution");
        }

        tracing::info!(
            accounts = ledger.account_count(),
            positions = staking.position_count(),
            proposals = governance.proposal_count(),
            "node restored from store"
        );
        Self::assemble(
            config,
            DaoState {
                ledger,
                staking,
                governance,
            },
            settlement,
            clock,
        )
    }

    fn assemble(
        config: NodeConfig,
        state: DaoState,
        settlement: Arc<S>,
        clock: Arc<C>,
    ) -> Result<Self, NodeError> {
        let metrics = DaoMetrics::new()?;
        refresh_gauges(&state, &metrics);
        Ok(Self {
            config,
            state: Arc::new(Mutex::new(state)),
            settlement,
            clock,
            events: Arc::new(EventBus::new()),
            metrics: Arc::new(metrics),
            shutdown: Arc::new(ShutdownController::new()),
            task_handles: Vec::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &DaoMetrics {
        &self.metrics
    }

    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Register an event listener. See [`EventBus`] for the constraints on
    /// listeners.
    pub fn subscribe(&self, listener: Box<dyn Fn(&DaoEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Spawn background tasks. Only the proposal sweep exists, and only when
    /// `sweep_interval_secs > 0`.
    pub fn start(&mut self) {
        if self.config.sweep_interval_secs == 0 {
            tracing::info!("periodic sweep disabled, proposals resolve on access");
            return;
        }
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let events = Arc::clone(&self.events);
        let metrics = Arc::clone(&self.metrics);
        let mut shutdown_rx = self.shutdown.subscribe();
        let period = Duration::from_secs(self.config.sweep_interval_secs);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.triggered() => {
                        tracing::info!("sweep task shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let mut guard = state.lock().await;
                        let state = &mut *guard;
                        let now = clock.now();
                        let swept = tracing_spans::sweep_span()
                            .in_scope(|| state.governance.sweep(&state.ledger, now));
                        match swept {
                            Ok(0) => {}
                            Ok(transitions) => {
                                tracing::debug!(transitions, "sweep resolved proposals")
                            }
                            Err(e) => tracing::warn!(error = %e, "sweep failed"),
                        }
                        publish_status_changes(state, &events, &metrics);
                    }
                }
            }
        });
        self.task_handles.push(handle);
        tracing::info!(interval_secs = self.config.sweep_interval_secs, "periodic sweep started");
    }

    /// Signal background tasks and wait for them to finish.
    pub async fn stop(&mut self) {
        tracing::info!("GDAO node stopping");
        self.shutdown.shutdown();
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
    }

    /// Persist every engine to `store` as one consistent cut.
    pub async fn checkpoint<T>(&self, store: &T) -> Result<(), NodeError>
    where
        T: DaoStore + Sync + ?Sized,
    {
        let now = self.clock.now();
        let state = self.state.lock().await;
        state.ledger.save_to_store(store, now)?;
        state.staking.save_to_store(store)?;
        state.governance.save_to_store(store)?;
        tracing::info!(
            accounts = state.ledger.account_count(),
            positions = state.staking.position_count(),
            proposals = state.governance.proposal_count(),
            "checkpoint written"
        );
        Ok(())
    }

    // ── Ledger ──────────────────────────────────────────────────────────

    pub async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), NodeError> {
        self.with_state("transfer", |state, _now| {
            state.ledger.transfer(from, to, amount)?;
            tracing::info!(%from, %to, %amount, "transfer applied");
            self.events.emit(&DaoEvent::Transferred {
                from: from.clone(),
                to: to.clone(),
                amount,
            });
            Ok(())
        })
        .await
    }

    /// Pay `amount` out of the treasury to `to`.
    pub async fn grant_from_treasury(
        &self,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), NodeError> {
        self.with_state("grant_from_treasury", |state, _now| {
            state.ledger.grant_from_treasury(to, amount)?;
            tracing::info!(%to, %amount, "treasury grant applied");
            self.events.emit(&DaoEvent::TreasuryGranted {
                to: to.clone(),
                amount,
            });
            Ok(())
        })
        .await
    }

    pub async fn balance_of(&self, address: &Address) -> TokenAmount {
        self.state.lock().await.ledger.balance_of(address)
    }

    pub async fn token_info(&self) -> TokenInfo {
        self.state.lock().await.ledger.token_info().clone()
    }

    pub async fn treasury_balance(&self) -> TokenAmount {
        self.state.lock().await.ledger.treasury_balance()
    }

    /// Transfers currently waiting for settlement.
    pub async fn pending_holds(&self) -> Vec<Hold> {
        self.state.lock().await.ledger.pending_holds().cloned().collect()
    }

    /// Check conservation of value across the whole ledger.
    pub async fn audit(&self) -> Result<(), NodeError> {
        Ok(self.state.lock().await.ledger.audit()?)
    }

    // ── Staking ─────────────────────────────────────────────────────────

    pub async fn stake(
        &self,
        user: &Address,
        pool_id: PoolId,
        amount: TokenAmount,
    ) -> Result<StakingPosition, NodeError> {
        self.with_state("stake", |state, now| {
            let position = state
                .staking
                .stake(&mut state.ledger, user, pool_id, amount, now)?;
            tracing::info!(%user, pool = pool_id, position = position.id, %amount, "stake opened");
            self.events.emit(&DaoEvent::Staked {
                user: user.clone(),
                position_id: position.id,
                pool_id,
                amount,
            });
            Ok(position)
        })
        .await
    }

    /// Close a position. Returns `(principal, reward)`.
    pub async fn unstake(
        &self,
        user: &Address,
        position_id: PositionId,
    ) -> Result<(TokenAmount, TokenAmount), NodeError> {
        self.with_state("unstake", |state, now| {
            let (principal, reward) =
                state
                    .staking
                    .unstake(&mut state.ledger, user, position_id, now)?;
            tracing::info!(%user, position = position_id, %principal, %reward, "stake closed");
            self.events.emit(&DaoEvent::Unstaked {
                user: user.clone(),
                position_id,
                principal,
                reward,
            });
            Ok((principal, reward))
        })
        .await
    }

    pub async fn claim_rewards(
        &self,
        user: &Address,
        position_id: PositionId,
    ) -> Result<TokenAmount, NodeError> {
        self.with_state("claim_rewards", |state, now| {
            let amount = state
                .staking
                .claim_rewards(&mut state.ledger, user, position_id, now)?;
            tracing::info!(%user, position = position_id, %amount, "rewards claimed");
            self.events.emit(&DaoEvent::RewardsClaimed {
                user: user.clone(),
                position_id,
                amount,
            });
            Ok(amount)
        })
        .await
    }

    pub async fn pending_rewards(&self, position_id: PositionId) -> Result<TokenAmount, NodeError> {
        let now = self.clock.now();
        Ok(self
            .state
            .lock()
            .await
            .staking
            .pending_rewards(position_id, now)?)
    }

    pub async fn positions_of(
        &self,
        user: &Address,
    ) -> Result<Vec<PositionView>, NodeError> {
        let now = self.clock.now();
        Ok(self.state.lock().await.staking.positions_of(user, now)?)
    }

    pub async fn staked_amount(&self, user: &Address) -> Result<TokenAmount, NodeError> {
        Ok(self.state.lock().await.staking.staked_amount(user)?)
    }

    pub async fn pool_stats(&self) -> Result<StakingStats, NodeError> {
        Ok(self.state.lock().await.staking.pool_stats()?)
    }

    // ── Governance ──────────────────────────────────────────────────────

    pub async fn create_proposal(
        &self,
        proposer: &Address,
        title: &str,
        description: &str,
        payload: Option<ExecutionPayload>,
    ) -> Result<Proposal, NodeError> {
        self.with_state("create_proposal", |state, now| {
            let proposal = state.governance.create_proposal(
                &state.ledger,
                proposer,
                title,
                description,
                payload,
                now,
            )?;
            tracing::info!(
                proposal = proposal.id,
                %proposer,
                start = %proposal.start_time,
                end = %proposal.end_time,
                "proposal created"
            );
            self.events.emit(&DaoEvent::ProposalCreated {
                proposal_id: proposal.id,
                proposer: proposer.clone(),
                start_time: proposal.start_time,
                end_time: proposal.end_time,
            });
            Ok(proposal)
        })
        .await
    }

    pub async fn cast_vote(
        &self,
        voter: &Address,
        proposal_id: ProposalId,
        choice: VoteChoice,
    ) -> Result<Vote, NodeError> {
        self.with_state("cast_vote", |state, now| {
            let vote = state
                .governance
                .cast_vote(&state.ledger, voter, proposal_id, choice, now)?;
            tracing::info!(
                proposal = proposal_id,
                %voter,
                %choice,
                power = %vote.power,
                "vote cast"
            );
            self.events.emit(&DaoEvent::VoteCast {
                proposal_id,
                voter: voter.clone(),
                choice,
                power: vote.power,
            });
            Ok(vote)
        })
        .await
    }

    pub async fn cancel_proposal(
        &self,
        proposal_id: ProposalId,
        caller: &Address,
    ) -> Result<Proposal, NodeError> {
        self.with_state("cancel_proposal", |state, now| {
            let proposal =
                state
                    .governance
                    .cancel_proposal(proposal_id, caller, &state.ledger, now)?;
            tracing::info!(proposal = proposal_id, %caller, "proposal cancelled");
            Ok(proposal)
        })
        .await
    }

    /// Execute a succeeded proposal once its timelock has elapsed.
    ///
    /// With `settle_on_chain`, a transfer payload is settled in two phases:
    /// the amount is held, `submit_on_chain` runs without the lock, and the
    /// hold is committed only once a transaction id comes back. On failure,
    /// timeout or cancellation the hold is refunded and the proposal stays
    /// `Succeeded`.
    pub async fn execute_proposal(&self, proposal_id: ProposalId) -> Result<Proposal, NodeError> {
        let result = self
            .execute(proposal_id)
            .instrument(tracing_spans::proposal_span("execute_proposal", proposal_id))
            .await;
        self.record("execute_proposal", result)
    }

    /// A proposal with its status resolved against the current time.
    pub async fn proposal(&self, proposal_id: ProposalId) -> Result<Proposal, NodeError> {
        self.query(|state, now| Ok(state.governance.proposal(proposal_id, &state.ledger, now)?))
            .await
    }

    pub async fn proposal_result(
        &self,
        proposal_id: ProposalId,
    ) -> Result<ProposalResult, NodeError> {
        self.query(|state, now| {
            Ok(state
                .governance
                .proposal_result(proposal_id, &state.ledger, now)?)
        })
        .await
    }

    /// Every proposal, resolved against the current time.
    pub async fn proposals(&self) -> Result<Vec<Proposal>, NodeError> {
        self.query(|state, now| {
            state.governance.sweep(&state.ledger, now)?;
            Ok(state.governance.proposals().cloned().collect())
        })
        .await
    }

    pub async fn votes(&self, proposal_id: ProposalId) -> Vec<Vote> {
        self.state.lock().await.governance.votes(proposal_id).to_vec()
    }

    pub async fn voting_power(&self, voter: &Address) -> TokenAmount {
        let state = self.state.lock().await;
        state.governance.voting_power(&state.ledger, voter)
    }

    pub async fn governance_params(&self) -> GovernanceParams {
        self.state.lock().await.governance.params().clone()
    }

    /// Resolve every open proposal now. Returns the number of transitions.
    pub async fn sweep(&self) -> Result<usize, NodeError> {
        self.with_state("sweep", |state, now| {
            Ok(state.governance.sweep(&state.ledger, now)?)
        })
        .await
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Run one mutating operation under the lock, then publish whatever
    /// status transitions it caused.
    async fn with_state<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut DaoState, Timestamp) -> Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        let mut guard = self.state.lock().await;
        let now = self.clock.now();
        let result = tracing_spans::operation_span(operation).in_scope(|| f(&mut *guard, now));
        publish_status_changes(&mut guard, &self.events, &self.metrics);
        drop(guard);
        self.record(operation, result)
    }

    /// Reads resolve lazily, so they may also cause transitions.
    async fn query<T>(
        &self,
        f: impl FnOnce(&mut DaoState, Timestamp) -> Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        let mut guard = self.state.lock().await;
        let now = self.clock.now();
        let result = f(&mut *guard, now);
        publish_status_changes(&mut guard, &self.events, &self.metrics);
        result
    }

    fn record<T>(
        &self,
        operation: &'static str,
        result: Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        match &result {
            Ok(_) => self.metrics.operations.with_label_values(&[operation]).inc(),
            Err(e) => {
                self.metrics
                    .rejected_operations
                    .with_label_values(&[operation])
                    .inc();
                tracing::warn!(operation, error = %e, "operation rejected");
            }
        }
        result
    }

    async fn execute(&self, proposal_id: ProposalId) -> Result<Proposal, NodeError> {
        let pending = {
            let mut guard = self.state.lock().await;
            let now = self.clock.now();
            let staged = self.stage_execution(&mut guard, proposal_id, now);
            publish_status_changes(&mut guard, &self.events, &self.metrics);
            match staged? {
                Staged::Done(proposal) => return Ok(proposal),
                Staged::Settle(pending) => pending,
            }
        };
        self.settle(pending).await
    }

    /// First phase, under the lock. Anything but a settled transfer
    /// completes right here.
    fn stage_execution(
        &self,
        state: &mut DaoState,
        proposal_id: ProposalId,
        now: Timestamp,
    ) -> Result<Staged, NodeError> {
        if !self.config.settle_on_chain {
            let proposal = state
                .governance
                .execute_proposal(&mut state.ledger, proposal_id, now)?;
            self.announce_executed(&proposal);
            return Ok(Staged::Done(proposal));
        }

        let ticket = state.governance.begin_execution(proposal_id, &state.ledger, now)?;
        let transfer = match ticket.payload() {
            Some(ExecutionPayload::Transfer {
                from_address,
                to_address,
                amount,
            }) => Some((from_address.clone(), to_address.clone(), *amount)),
            _ => None,
        };
        let Some((from, to, amount)) = transfer else {
            let proposal = state.governance.complete_execution(ticket, None, now)?;
            self.announce_executed(&proposal);
            return Ok(Staged::Done(proposal));
        };

        let reference = format!("proposal-{proposal_id}");
        let hold = match state
            .ledger
            .place_hold(reference.clone(), &from, &to, amount, now)
        {
            Ok(hold) => hold,
            Err(e) => {
                state.governance.abort_execution(ticket);
                return Err(e.into());
            }
        };
        tracing::info!(hold = hold.id, %reference, %amount, "transfer held for settlement");
        Ok(Staged::Settle(PendingSettlement {
            ticket,
            hold_id: hold.id,
            request: SettlementRequest {
                reference,
                from,
                to,
                amount,
            },
        }))
    }

    /// Second phase: settle outside the lock, then apply the outcome.
    async fn settle(&self, pending: PendingSettlement) -> Result<Proposal, NodeError> {
        let request = pending.request.clone();
        let mut guard = SettlementGuard {
            state: Arc::clone(&self.state),
            metrics: Arc::clone(&self.metrics),
            pending: Some(pending),
        };

        let timeout_secs = self.config.settlement_timeout_secs;
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.settlement.submit_on_chain(&request),
        )
        .instrument(tracing_spans::settlement_span(&request.reference))
        .await
        .unwrap_or(Err(SettlementError::TimedOut(timeout_secs)));
        self.metrics
            .settlement_latency_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);

        let mut state = self.state.lock().await;
        let Some(PendingSettlement { ticket, hold_id, .. }) = guard.disarm() else {
            return Err(NodeError::Settlement(SettlementError::Unavailable(
                "settlement already resolved".to_string(),
            )));
        };
        let now = self.clock.now();
        let result = match outcome {
            Ok(tx) => match state.ledger.commit_hold(hold_id) {
                Ok(_) => {
                    self.metrics.settlements_confirmed.inc();
                    tracing::info!(reference = %request.reference, %tx, "settlement confirmed");
                    state
                        .governance
                        .complete_execution(ticket, Some(tx), now)
                        .map_err(NodeError::from)
                }
                Err(e) => {
                    roll_back(&mut state, hold_id, ticket);
                    Err(e.into())
                }
            },
            Err(e) => {
                self.metrics.settlements_failed.inc();
                tracing::warn!(
                    reference = %request.reference,
                    error = %e,
                    "settlement failed, releasing hold"
                );
                roll_back(&mut state, hold_id, ticket);
                Err(NodeError::Settlement(e))
            }
        };
        if let Ok(proposal) = &result {
            self.announce_executed(proposal);
        }
        publish_status_changes(&mut state, &self.events, &self.metrics);
        result
    }

    fn announce_executed(&self, proposal: &Proposal) {
        tracing::info!(
            proposal = proposal.id,
            tx = proposal.settlement_tx.as_ref().map(|tx| tx.0.as_str()),
            "proposal executed"
        );
        self.events.emit(&DaoEvent::ProposalExecuted {
            proposal_id: proposal.id,
            settlement_tx: proposal.settlement_tx.clone(),
        });
    }
}

/// Refund a hold and release the proposal reservation.
fn roll_back(state: &mut DaoState, hold_id: HoldId, ticket: ExecutionTicket) {
    if let Err(e) = state.ledger.release_hold(hold_id) {
        tracing::error!(hold = hold_id, error = %e, "failed to release hold");
    }
    state.governance.abort_execution(ticket);
}

fn publish_status_changes(state: &mut DaoState, events: &EventBus, metrics: &DaoMetrics) {
    for change in state.governance.take_status_changes() {
        metrics.status_changes.inc();
        tracing::info!(
            proposal = change.proposal_id,
            from = %change.from,
            to = %change.to,
            "proposal status changed"
        );
        events.emit(&DaoEvent::ProposalStatusChanged {
            proposal_id: change.proposal_id,
            from: change.from,
            to: change.to,
            at: change.at,
        });
    }
    refresh_gauges(state, metrics);
}

fn refresh_gauges(state: &DaoState, metrics: &DaoMetrics) {
    metrics
        .proposal_count
        .set(state.governance.proposal_count() as i64);
    metrics
        .open_positions
        .set(state.staking.position_count() as i64);
    metrics.account_count.set(state.ledger.account_count() as i64);
    metrics
        .pending_holds
        .set(state.ledger.pending_holds().count() as i64);
}
