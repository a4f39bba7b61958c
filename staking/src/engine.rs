//! Core staking engine.

use crate::error::StakingError;
use crate::pool::{PoolConfig, PoolId, StakingPool};
use crate::position::{PositionId, PositionView, StakingPosition};
use crate::reward::{accrued_reward, RewardSource};
use gdao_ledger::{Ledger, LedgerError};
use gdao_store::{MetaStore, StakingStore};
use gdao_types::{Address, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const META_NEXT_POSITION_ID: &str = "staking_next_position_id";
const META_REWARD_SOURCE: &str = "staking_reward_source";

/// Aggregate totals for one pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub pool: PoolConfig,
    pub total_staked: TokenAmount,
    pub total_rewards_distributed: TokenAmount,
    pub open_positions: usize,
}

/// Aggregate totals across all pools.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingStats {
    pub total_staked: TokenAmount,
    pub total_rewards_distributed: TokenAmount,
    pub pools: Vec<PoolStats>,
}

/// The staking engine. Owns pools and positions, moves principal and
/// rewards through the [`Ledger`].
///
/// Every mutating call validates everything it can before touching the
/// ledger, so a rejected call leaves balances, pool totals and the position
/// set exactly as they were.
#[derive(Clone, Debug)]
pub struct StakingEngine {
    pools: BTreeMap<PoolId, StakingPool>,
    positions: BTreeMap<PositionId, StakingPosition>,
    next_position_id: PositionId,
    reward_source: RewardSource,
}

impl StakingEngine {
    /// Create an engine with the given pools.
    pub fn new(
        pools: Vec<PoolConfig>,
        reward_source: RewardSource,
    ) -> Result<Self, StakingError> {
        let mut by_id = BTreeMap::new();
        for config in pools {
            config.validate()?;
            let id = config.id;
            if by_id.insert(id, StakingPool::new(config)).is_some() {
                return Err(StakingError::InvalidPoolConfig(format!("duplicate pool id {id}")));
            }
        }
        Ok(Self {
            pools: by_id,
            positions: BTreeMap::new(),
            next_position_id: 1,
            reward_source,
        })
    }

    /// Engine with the reference pools, minting rewards.
    pub fn with_default_pools() -> Self {
        let pools = PoolConfig::defaults()
            .into_iter()
            .map(|config| (config.id, StakingPool::new(config)))
            .collect();
        Self {
            pools,
            positions: BTreeMap::new(),
            next_position_id: 1,
            reward_source: RewardSource::Mint,
        }
    }

    pub fn reward_source(&self) -> RewardSource {
        self.reward_source
    }

    pub fn pool(&self, pool_id: PoolId) -> Option<&StakingPool> {
        self.pools.get(&pool_id)
    }

    pub fn pools(&self) -> impl Iterator<Item = &StakingPool> {
        self.pools.values()
    }

    pub fn position(&self, position_id: PositionId) -> Option<&StakingPosition> {
        self.positions.get(&position_id)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Lock `amount` of `user`'s balance into a new position in `pool_id`.
    pub fn stake(
        &mut self,
        ledger: &mut Ledger,
        user: &Address,
        pool_id: PoolId,
        amount: TokenAmount,
        now: Timestamp,
    ) -> Result<StakingPosition, StakingError> {
        if amount.is_zero() {
            return Err(StakingError::InvalidAmount);
        }
        let pool = self
            .pools
            .get(&pool_id)
            .ok_or(StakingError::UnknownPool(pool_id))?;
        if amount < pool.config.min_stake {
            return Err(StakingError::BelowMinimumStake {
                minimum: pool.config.min_stake,
                amount,
            });
        }
        let available = ledger.balance_of(user);
        if amount > available {
            return Err(StakingError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let pool_total = pool
            .total_staked
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        let next_position_id = self
            .next_position_id
            .checked_add(1)
            .ok_or(StakingError::Overflow)?;
        let end_time = pool.lock_end(now);

        ledger.lock_stake(user, amount).map_err(balance_error)?;

        let position = StakingPosition {
            id: self.next_position_id,
            owner: user.clone(),
            pool_id,
            principal: amount,
            start_time: now,
            end_time,
            rewards_claimed: TokenAmount::ZERO,
            last_claim_time: now,
        };
        if let Some(pool) = self.pools.get_mut(&pool_id) {
            pool.total_staked = pool_total;
        }
        self.positions.insert(position.id, position.clone());
        self.next_position_id = next_position_id;
        tracing::debug!(%user, pool_id, position = position.id, %amount, "position opened");
        Ok(position)
    }

    /// Close a position, returning `(principal, reward)` to its owner.
    pub fn unstake(
        &mut self,
        ledger: &mut Ledger,
        user: &Address,
        position_id: PositionId,
        now: Timestamp,
    ) -> Result<(TokenAmount, TokenAmount), StakingError> {
        let position = self.owned_position(user, position_id)?;
        if let Some(until) = position.end_time.filter(|_| position.is_locked_at(now)) {
            return Err(StakingError::TokensLocked { until });
        }
        let principal = position.principal;
        let pool_id = position.pool_id;
        let reward = self.reward_for(position, now)?;

        let pool = self
            .pools
            .get(&pool_id)
            .ok_or(StakingError::UnknownPool(pool_id))?;
        let pool_total = pool
            .total_staked
            .checked_sub(principal)
            .ok_or(StakingError::Overflow)?;
        let pool_rewards = pool
            .total_rewards_distributed
            .checked_add(reward)
            .ok_or(StakingError::Overflow)?;
        self.check_reward_funding(ledger, reward)?;

        ledger.release_stake(user, principal)?;
        self.pay_reward(ledger, user, reward)?;

        if let Some(pool) = self.pools.get_mut(&pool_id) {
            pool.total_staked = pool_total;
            pool.total_rewards_distributed = pool_rewards;
        }
        self.positions.remove(&position_id);
        tracing::debug!(%user, position = position_id, %principal, %reward, "position closed");
        Ok((principal, reward))
    }

    /// Pay out the reward accrued since the last claim, keeping the position open.
    pub fn claim_rewards(
        &mut self,
        ledger: &mut Ledger,
        user: &Address,
        position_id: PositionId,
        now: Timestamp,
    ) -> Result<TokenAmount, StakingError> {
        let position = self.owned_position(user, position_id)?;
        let pool_id = position.pool_id;
        let reward = self.reward_for(position, now)?;
        let claimed = position
            .rewards_claimed
            .checked_add(reward)
            .ok_or(StakingError::Overflow)?;
        let pool_rewards = self
            .pools
            .get(&pool_id)
            .ok_or(StakingError::UnknownPool(pool_id))?
            .total_rewards_distributed
            .checked_add(reward)
            .ok_or(StakingError::Overflow)?;
        self.check_reward_funding(ledger, reward)?;

        self.pay_reward(ledger, user, reward)?;

        if let Some(pool) = self.pools.get_mut(&pool_id) {
            pool.total_rewards_distributed = pool_rewards;
        }
        if let Some(position) = self.positions.get_mut(&position_id) {
            position.rewards_claimed = claimed;
            position.last_claim_time = now;
        }
        tracing::debug!(%user, position = position_id, %reward, "rewards claimed");
        Ok(reward)
    }

    /// Reward that `claim_rewards` would pay at `now`.
    pub fn pending_rewards(
        &self,
        position_id: PositionId,
        now: Timestamp,
    ) -> Result<TokenAmount, StakingError> {
        let position = self
            .positions
            .get(&position_id)
            .ok_or(StakingError::UnknownPosition(position_id))?;
        self.reward_for(position, now)
    }

    /// All of `user`'s open positions, ordered by id.
    pub fn positions_of(
        &self,
        user: &Address,
        now: Timestamp,
    ) -> Result<Vec<PositionView>, StakingError> {
        self.positions
            .values()
            .filter(|p| &p.owner == user)
            .map(|p| {
                let pool = self
                    .pools
                    .get(&p.pool_id)
                    .ok_or(StakingError::UnknownPool(p.pool_id))?;
                Ok(PositionView {
                    id: p.id,
                    pool_id: p.pool_id,
                    mode: pool.mode(),
                    principal: p.principal,
                    start_time: p.start_time,
                    end_time: p.end_time,
                    pending_rewards: self.reward_for(p, now)?,
                    rewards_claimed: p.rewards_claimed,
                    locked: p.is_locked_at(now),
                })
            })
            .collect()
    }

    /// Total principal `user` has staked across all pools.
    pub fn staked_amount(&self, user: &Address) -> Result<TokenAmount, StakingError> {
        TokenAmount::checked_sum(
            self.positions
                .values()
                .filter(|p| &p.owner == user)
                .map(|p| p.principal),
        )
        .ok_or(StakingError::Overflow)
    }

    /// Aggregate view of every pool.
    pub fn pool_stats(&self) -> Result<StakingStats, StakingError> {
        let pools: Vec<PoolStats> = self
            .pools
            .values()
            .map(|pool| PoolStats {
                pool: pool.config.clone(),
                total_staked: pool.total_staked,
                total_rewards_distributed: pool.total_rewards_distributed,
                open_positions: self
                    .positions
                    .values()
                    .filter(|p| p.pool_id == pool.id())
                    .count(),
            })
            .collect();
        let total_staked = TokenAmount::checked_sum(pools.iter().map(|p| p.total_staked))
            .ok_or(StakingError::Overflow)?;
        let total_rewards_distributed =
            TokenAmount::checked_sum(pools.iter().map(|p| p.total_rewards_distributed))
                .ok_or(StakingError::Overflow)?;
        Ok(StakingStats {
            total_staked,
            total_rewards_distributed,
            pools,
        })
    }

    fn owned_position(
        &self,
        user: &Address,
        position_id: PositionId,
    ) -> Result<&StakingPosition, StakingError> {
        self.positions
            .get(&position_id)
            .filter(|p| &p.owner == user)
            .ok_or(StakingError::UnknownPosition(position_id))
    }

    fn reward_for(
        &self,
        position: &StakingPosition,
        now: Timestamp,
    ) -> Result<TokenAmount, StakingError> {
        let pool = self
            .pools
            .get(&position.pool_id)
            .ok_or(StakingError::UnknownPool(position.pool_id))?;
        let elapsed = position.last_claim_time.elapsed_since(now);
        accrued_reward(position.principal, pool.config.apr_bps, elapsed)
            .ok_or(StakingError::Overflow)
    }

    fn check_reward_funding(
        &self,
        ledger: &Ledger,
        reward: TokenAmount,
    ) -> Result<(), StakingError> {
        if self.reward_source == RewardSource::Treasury && reward > ledger.treasury_balance() {
            return Err(StakingError::InsufficientRewardFunds {
                needed: reward,
                available: ledger.treasury_balance(),
            });
        }
        Ok(())
    }

    fn pay_reward(
        &self,
        ledger: &mut Ledger,
        user: &Address,
        reward: TokenAmount,
    ) -> Result<(), StakingError> {
        match self.reward_source {
            RewardSource::Mint => ledger.mint_reward(user, reward)?,
            RewardSource::Treasury => ledger.pay_reward_from_treasury(user, reward)?,
        }
        Ok(())
    }
}

fn balance_error(err: LedgerError) -> StakingError {
    match err {
        LedgerError::InsufficientBalance { needed, available } => {
            StakingError::InsufficientBalance { needed, available }
        }
        other => StakingError::Ledger(other),
    }
}

impl StakingEngine {
    /// Persist pools, positions and counters to a store.
    ///
    /// Positions closed since the last save are deleted from the store.
    pub fn save_to_store<S>(&self, store: &S) -> Result<(), StakingError>
    where
        S: StakingStore + MetaStore + ?Sized,
    {
        store.put_meta(META_NEXT_POSITION_ID, &self.next_position_id.to_be_bytes())?;
        let source = bincode::serialize(&self.reward_source)
            .map_err(|e| StakingError::Serialization(e.to_string()))?;
        store.put_meta(META_REWARD_SOURCE, &source)?;

        for (id, pool) in &self.pools {
            let bytes =
                bincode::serialize(pool).map_err(|e| StakingError::Serialization(e.to_string()))?;
            store.put_pool(*id, &bytes)?;
        }
        for (id, _) in store.iter_positions()? {
            if !self.positions.contains_key(&id) {
                store.delete_position(id)?;
            }
        }
        for (id, position) in &self.positions {
            let bytes = bincode::serialize(position)
                .map_err(|e| StakingError::Serialization(e.to_string()))?;
            store.put_position(*id, &bytes)?;
        }
        Ok(())
    }

    /// Restore engine state from a store. `None` when no pools were saved.
    pub fn load_from_store<S>(store: &S) -> Result<Option<Self>, StakingError>
    where
        S: StakingStore + MetaStore + ?Sized,
    {
        let stored_pools = store.iter_pools()?;
        if stored_pools.is_empty() {
            return Ok(None);
        }
        let mut pools = BTreeMap::new();
        for (id, bytes) in stored_pools {
            let pool: StakingPool = bincode::deserialize(&bytes)
                .map_err(|e| StakingError::Serialization(e.to_string()))?;
            pools.insert(id, pool);
        }
        let mut positions = BTreeMap::new();
        for (id, bytes) in store.iter_positions()? {
            let position: StakingPosition = bincode::deserialize(&bytes)
                .map_err(|e| StakingError::Serialization(e.to_string()))?;
            positions.insert(id, position);
        }
        let next_position_id = match store.get_meta(META_NEXT_POSITION_ID)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StakingError::Serialization("malformed next position id".to_string())
                })?;
                u64::from_be_bytes(raw)
            }
            None => positions.keys().next_back().map_or(1, |id| id + 1),
        };
        let reward_source = match store.get_meta(META_REWARD_SOURCE)? {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| StakingError::Serialization(e.to_string()))?,
            None => RewardSource::default(),
        };
        Ok(Some(Self {
            pools,
            positions,
            next_position_id,
            reward_source,
        }))
    }
}

impl Default for StakingEngine {
    fn default() -> Self {
        Self::with_default_pools()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::SECONDS_PER_YEAR;
    use gdao_ledger::GenesisConfig;
    use gdao_nullables::NullStore;

    const DAY: u64 = 86_400;

    fn tokens(n: u64) -> TokenAmount {
        TokenAmount::from_tokens(n)
    }

    fn alice() -> Address {
        Address::new("alice")
    }

    fn setup() -> (Ledger, StakingEngine) {
        let config = GenesisConfig::default().with_allocation("alice", tokens(20_000));
        (Ledger::genesis(&config).unwrap(), StakingEngine::with_default_pools())
    }

    #[test]
    fn stake_debits_balance_and_opens_position() {
        let (mut ledger, mut engine) = setup();
        let position = engine
            .stake(&mut ledger, &alice(), 1, tokens(2000), Timestamp::new(1000))
            .unwrap();
        assert_eq!(position.id, 1);
        assert_eq!(position.end_time, None);
        assert_eq!(ledger.balance_of(&alice()), tokens(18_000));
        assert_eq!(engine.pool(1).unwrap().total_staked, tokens(2000));
        assert_eq!(engine.staked_amount(&alice()).unwrap(), tokens(2000));
        ledger.audit().unwrap();
    }

    #[test]
    fn stake_into_unknown_pool_fails() {
        let (mut ledger, mut engine) = setup();
        assert!(matches!(
            engine.stake(&mut ledger, &alice(), 9, tokens(2000), Timestamp::new(0)),
            Err(StakingError::UnknownPool(9))
        ));
    }

    #[test]
    fn stake_below_minimum_fails() {
        let (mut ledger, mut engine) = setup();
        assert!(matches!(
            engine.stake(&mut ledger, &alice(), 2, tokens(4999), Timestamp::new(0)),
            Err(StakingError::BelowMinimumStake { .. })
        ));
    }

    #[test]
    fn overdrawn_stake_changes_nothing() {
        let (mut ledger, mut engine) = setup();
        let err = engine
            .stake(&mut ledger, &alice(), 1, tokens(20_001), Timestamp::new(0))
            .unwrap_err();
        assert!(matches!(err, StakingError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(&alice()), tokens(20_000));
        assert_eq!(engine.pool(1).unwrap().total_staked, TokenAmount::ZERO);
        assert_eq!(engine.position_count(), 0);
    }

    #[test]
    fn locked_position_cannot_leave_early() {
        let (mut ledger, mut engine) = setup();
        let start = Timestamp::new(1000);
        let position = engine.stake(&mut ledger, &alice(), 2, tokens(5000), start).unwrap();
        let err = engine
            .unstake(&mut ledger, &alice(), position.id, start.plus_secs(30 * DAY - 1))
            .unwrap_err();
        match err {
            StakingError::TokensLocked { until } => assert_eq!(until, start.plus_secs(30 * DAY)),
            other => panic!("expected TokensLocked, got {other:?}"),
        }
        assert_eq!(engine.position_count(), 1);
    }

    #[test]
    fn locked_position_pays_principal_and_reward_after_maturity() {
        let (mut ledger, mut engine) = setup();
        let start = Timestamp::new(0);
        let position = engine.stake(&mut ledger, &alice(), 2, tokens(5000), start).unwrap();
        let (principal, reward) = engine
            .unstake(&mut ledger, &alice(), position.id, start.plus_secs(SECONDS_PER_YEAR))
            .unwrap();
        assert_eq!(principal, tokens(5000));
        assert_eq!(reward, tokens(1250));
        assert_eq!(ledger.balance_of(&alice()), tokens(21_250));
        assert_eq!(engine.pool(2).unwrap().total_staked, TokenAmount::ZERO);
        assert_eq!(engine.pool(2).unwrap().total_rewards_distributed, tokens(1250));
        assert_eq!(engine.position_count(), 0);
        ledger.audit().unwrap();
    }

    #[test]
    fn claim_resets_accrual_window() {
        let (mut ledger, mut engine) = setup();
        let position = engine
            .stake(&mut ledger, &alice(), 1, tokens(10_000), Timestamp::new(0))
            .unwrap();
        let half = Timestamp::new(SECONDS_PER_YEAR / 2);
        let first = engine.claim_rewards(&mut ledger, &alice(), position.id, half).unwrap();
        assert_eq!(first, tokens(750));
        assert_eq!(engine.pending_rewards(position.id, half).unwrap(), TokenAmount::ZERO);

        let stored = engine.position(position.id).unwrap();
        assert_eq!(stored.rewards_claimed, tokens(750));
        assert_eq!(stored.last_claim_time, half);

        let again = engine.claim_rewards(&mut ledger, &alice(), position.id, half).unwrap();
        assert_eq!(again, TokenAmount::ZERO);
    }

    #[test]
    fn other_users_cannot_touch_a_position() {
        let (mut ledger, mut engine) = setup();
        let position = engine
            .stake(&mut ledger, &alice(), 1, tokens(1000), Timestamp::new(0))
            .unwrap();
        let mallory = Address::new("mallory");
        assert!(matches!(
            engine.unstake(&mut ledger, &mallory, position.id, Timestamp::new(10)),
            Err(StakingError::UnknownPosition(_))
        ));
        assert!(matches!(
            engine.claim_rewards(&mut ledger, &mallory, position.id, Timestamp::new(10)),
            Err(StakingError::UnknownPosition(_))
        ));
    }

    #[test]
    fn treasury_funded_rewards_draw_down_the_treasury() {
        let (mut ledger, _) = setup();
        let mut engine =
            StakingEngine::new(PoolConfig::defaults(), RewardSource::Treasury).unwrap();
        let treasury_before = ledger.treasury_balance();
        let position = engine
            .stake(&mut ledger, &alice(), 1, tokens(10_000), Timestamp::new(0))
            .unwrap();
        let reward = engine
            .claim_rewards(&mut ledger, &alice(), position.id, Timestamp::new(SECONDS_PER_YEAR))
            .unwrap();
        assert_eq!(reward, tokens(1500));
        assert_eq!(ledger.total_minted(), TokenAmount::ZERO);
        assert_eq!(
            ledger.treasury_balance(),
            treasury_before.checked_sub(tokens(1500)).unwrap()
        );
        ledger.audit().unwrap();
    }

    #[test]
    fn positions_view_reports_pending_rewards() {
        let (mut ledger, mut engine) = setup();
        engine.stake(&mut ledger, &alice(), 1, tokens(1000), Timestamp::new(0)).unwrap();
        engine.stake(&mut ledger, &alice(), 2, tokens(5000), Timestamp::new(0)).unwrap();
        let views = engine
            .positions_of(&alice(), Timestamp::new(SECONDS_PER_YEAR))
            .unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].pending_rewards, tokens(150));
        assert!(!views[1].locked);

        let stats = engine.pool_stats().unwrap();
        assert_eq!(stats.total_staked, tokens(6000));
        assert_eq!(stats.pools.len(), 2);
        assert_eq!(stats.pools[1].open_positions, 1);
    }

    #[test]
    fn overflowing_reward_is_reported_not_zeroed() {
        let whale = TokenAmount::new(u128::MAX / 40_000);
        let config = GenesisConfig::new(gdao_types::TokenParams {
            total_supply: TokenAmount::new(u128::MAX / 20_000),
            ..gdao_types::TokenParams::default()
        })
        .with_allocation("alice", whale);
        let mut ledger = Ledger::genesis(&config).unwrap();
        let mut engine = StakingEngine::with_default_pools();
        let position = engine
            .stake(&mut ledger, &alice(), 1, whale, Timestamp::new(0))
            .unwrap();

        let later = Timestamp::new(SECONDS_PER_YEAR);
        assert!(matches!(
            engine.positions_of(&alice(), later),
            Err(StakingError::Overflow)
        ));
        assert!(matches!(
            engine.pending_rewards(position.id, later),
            Err(StakingError::Overflow)
        ));
        assert_eq!(engine.staked_amount(&alice()).unwrap(), whale);
    }

    #[test]
    fn duplicate_pool_ids_are_rejected() {
        let mut pools = PoolConfig::defaults();
        pools[1].id = 1;
        assert!(matches!(
            StakingEngine::new(pools, RewardSource::Mint),
            Err(StakingError::InvalidPoolConfig(_))
        ));
    }

    #[test]
    fn store_round_trip_drops_closed_positions() {
        let store = NullStore::new();
        let (mut ledger, mut engine) = setup();
        let first = engine
            .stake(&mut ledger, &alice(), 1, tokens(1000), Timestamp::new(0))
            .unwrap();
        engine.stake(&mut ledger, &alice(), 1, tokens(1000), Timestamp::new(0)).unwrap();
        engine.save_to_store(&store).unwrap();

        engine.unstake(&mut ledger, &alice(), first.id, Timestamp::new(5)).unwrap();
        engine.save_to_store(&store).unwrap();

        let loaded = StakingEngine::load_from_store(&store).unwrap().expect("engine stored");
        assert_eq!(loaded.position_count(), 1);
        assert!(loaded.position(first.id).is_none());
        assert_eq!(loaded.pool(1).unwrap().total_staked, tokens(1000));
        assert_eq!(loaded.next_position_id, 3);
    }
}
