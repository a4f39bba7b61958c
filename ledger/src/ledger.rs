//! The balance ledger.

use crate::error::LedgerError;
use crate::genesis::GenesisConfig;
use crate::hold::{Hold, HoldId};
use crate::snapshot::{LedgerSnapshot, SNAPSHOT_VERSION};
use gdao_store::{AccountStore, MetaStore};
use gdao_types::{Address, Timestamp, TokenAmount, TokenParams};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const META_KEY: &str = "ledger_snapshot";

/// Public description of the token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: TokenAmount,
    /// Informational: treasury at genesis plus allocations plus minted rewards.
    pub circulating_supply: TokenAmount,
}

/// Authoritative account balances and supply accounting.
///
/// Value lives in exactly one of five places: an account balance, the
/// treasury, the staked pool total, an open settlement hold, or nowhere yet
/// (unissued supply). The only path that creates value after genesis is
/// [`Ledger::mint_reward`].
#[derive(Clone, Debug)]
pub struct Ledger {
    token: TokenInfo,
    balances: HashMap<Address, TokenAmount>,
    treasury: TokenAmount,
    total_staked: TokenAmount,
    total_minted: TokenAmount,
    /// Treasury plus allocations at genesis.
    genesis_issued: TokenAmount,
    holds: BTreeMap<HoldId, Hold>,
    next_hold_id: HoldId,
}

impl Ledger {
    /// Create a ledger from a genesis configuration.
    pub fn genesis(config: &GenesisConfig) -> Result<Self, LedgerError> {
        let allocated = config.validate()?;
        let treasury = config.treasury_allocation()?;

        let mut balances: HashMap<Address, TokenAmount> = HashMap::new();
        for allocation in &config.allocations {
            let entry = balances.entry(allocation.address.clone()).or_default();
            *entry = entry
                .checked_add(allocation.amount)
                .ok_or(LedgerError::Overflow)?;
        }

        let genesis_issued = treasury.checked_add(allocated).ok_or(LedgerError::Overflow)?;
        let token = TokenInfo {
            name: config.token.name.clone(),
            symbol: config.token.symbol.clone(),
            decimals: config.token.decimals,
            total_supply: config.token.total_supply,
            circulating_supply: genesis_issued,
        };

        tracing::info!(
            total_supply = %token.total_supply,
            treasury = %treasury,
            allocations = config.allocations.len(),
            "ledger initialized"
        );

        Ok(Self {
            token,
            balances,
            treasury,
            total_staked: TokenAmount::ZERO,
            total_minted: TokenAmount::ZERO,
            genesis_issued,
            holds: BTreeMap::new(),
            next_hold_id: 1,
        })
    }

    /// A ledger with the given token and no allocations.
    pub fn new(token: TokenParams) -> Result<Self, LedgerError> {
        Self::genesis(&GenesisConfig::new(token))
    }

    // ── Read-only accessors ─────────────────────────────────────────────

    /// Balance of an address; unknown addresses hold zero.
    pub fn balance_of(&self, address: &Address) -> TokenAmount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    pub fn token_info(&self) -> &TokenInfo {
        &self.token
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.token.total_supply
    }

    pub fn circulating_supply(&self) -> TokenAmount {
        self.token.circulating_supply
    }

    pub fn treasury_balance(&self) -> TokenAmount {
        self.treasury
    }

    /// Principal currently locked in staking positions.
    pub fn total_staked(&self) -> TokenAmount {
        self.total_staked
    }

    /// Rewards minted since genesis.
    pub fn total_minted(&self) -> TokenAmount {
        self.total_minted
    }

    /// All known accounts, ordered by address.
    pub fn accounts(&self) -> Vec<(Address, TokenAmount)> {
        let mut accounts: Vec<_> = self
            .balances
            .iter()
            .map(|(address, balance)| (address.clone(), *balance))
            .collect();
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        accounts
    }

    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    /// Open settlement holds, ordered by id.
    pub fn pending_holds(&self) -> impl Iterator<Item = &Hold> {
        self.holds.values()
    }

    pub fn hold(&self, id: HoldId) -> Option<&Hold> {
        self.holds.get(&id)
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Move `amount` from one account to another.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        if !to.is_valid() {
            return Err(LedgerError::InvalidAddress(to.clone()));
        }
        let debited = self.debited_balance(from, amount)?;
        if from == to {
            return Ok(());
        }
        let credited = self.credited_balance(to, amount)?;
        self.balances.insert(from.clone(), debited);
        self.balances.insert(to.clone(), credited);
        tracing::debug!(%from, %to, %amount, "transfer applied");
        Ok(())
    }

    /// Pay `amount` out of the treasury.
    pub fn grant_from_treasury(
        &mut self,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        if !to.is_valid() {
            return Err(LedgerError::InvalidAddress(to.clone()));
        }
        let treasury = self.debited_treasury(amount)?;
        let credited = self.credited_balance(to, amount)?;
        self.treasury = treasury;
        self.balances.insert(to.clone(), credited);
        Ok(())
    }

    /// Move principal from a balance into the staked total.
    pub fn lock_stake(&mut self, user: &Address, amount: TokenAmount) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let debited = self.debited_balance(user, amount)?;
        let staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances.insert(user.clone(), debited);
        self.total_staked = staked;
        Ok(())
    }

    /// Return principal from the staked total to a balance.
    pub fn release_stake(
        &mut self,
        user: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        let staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(LedgerError::StakeUnderflow(amount))?;
        let credited = self.credited_balance(user, amount)?;
        self.total_staked = staked;
        self.balances.insert(user.clone(), credited);
        Ok(())
    }

    /// Credit a staking reward out of thin air.
    ///
    /// This is the single inflationary path: there is no cap and no funding
    /// account. Zero rewards are a no-op.
    pub fn mint_reward(&mut self, user: &Address, amount: TokenAmount) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let credited = self.credited_balance(user, amount)?;
        let minted = self
            .total_minted
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let circulating = self
            .token
            .circulating_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances.insert(user.clone(), credited);
        self.total_minted = minted;
        self.token.circulating_supply = circulating;
        Ok(())
    }

    /// Credit a staking reward funded by the treasury. Zero rewards are a no-op.
    pub fn pay_reward_from_treasury(
        &mut self,
        user: &Address,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let treasury = self.debited_treasury(amount)?;
        let credited = self.credited_balance(user, amount)?;
        self.treasury = treasury;
        self.balances.insert(user.clone(), credited);
        Ok(())
    }

    /// First phase of a settled transfer: take `amount` out of `from` and park
    /// it in a hold until settlement reports back.
    pub fn place_hold(
        &mut self,
        reference: impl Into<String>,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
        now: Timestamp,
    ) -> Result<Hold, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        if !to.is_valid() {
            return Err(LedgerError::InvalidAddress(to.clone()));
        }
        let debited = self.debited_balance(from, amount)?;
        let next_hold_id = self.next_hold_id.checked_add(1).ok_or(LedgerError::Overflow)?;
        let hold = Hold {
            id: self.next_hold_id,
            reference: reference.into(),
            from: from.clone(),
            to: to.clone(),
            amount,
            placed_at: now,
        };
        self.balances.insert(from.clone(), debited);
        self.holds.insert(hold.id, hold.clone());
        self.next_hold_id = next_hold_id;
        tracing::debug!(hold = hold.id, reference = %hold.reference, %amount, "hold placed");
        Ok(hold)
    }

    /// Settlement confirmed: deliver the held amount to the recipient.
    pub fn commit_hold(&mut self, id: HoldId) -> Result<Hold, LedgerError> {
        let hold = self.holds.get(&id).ok_or(LedgerError::HoldNotFound(id))?;
        let credited = self.credited_balance(&hold.to, hold.amount)?;
        let to = hold.to.clone();
        self.balances.insert(to, credited);
        let hold = self.holds.remove(&id).ok_or(LedgerError::HoldNotFound(id))?;
        tracing::debug!(hold = id, "hold committed");
        Ok(hold)
    }

    /// Settlement failed: refund the held amount to the sender.
    pub fn release_hold(&mut self, id: HoldId) -> Result<Hold, LedgerError> {
        let hold = self.holds.get(&id).ok_or(LedgerError::HoldNotFound(id))?;
        let credited = self.credited_balance(&hold.from, hold.amount)?;
        let from = hold.from.clone();
        self.balances.insert(from, credited);
        let hold = self.holds.remove(&id).ok_or(LedgerError::HoldNotFound(id))?;
        tracing::debug!(hold = id, "hold released");
        Ok(hold)
    }

    /// Verify conservation of value:
    /// `Σ balances + treasury + staked + Σ holds == genesis issue + minted`.
    pub fn audit(&self) -> Result<(), LedgerError> {
        let balances =
            TokenAmount::checked_sum(self.balances.values().copied()).ok_or(LedgerError::Overflow)?;
        let held = TokenAmount::checked_sum(self.holds.values().map(|h| h.amount))
            .ok_or(LedgerError::Overflow)?;
        let actual = TokenAmount::checked_sum([balances, self.treasury, self.total_staked, held])
            .ok_or(LedgerError::Overflow)?;
        let expected = self
            .genesis_issued
            .checked_add(self.total_minted)
            .ok_or(LedgerError::Overflow)?;
        if actual != expected {
            return Err(LedgerError::ConservationViolated { expected, actual });
        }
        Ok(())
    }

    // ── Snapshots and persistence ───────────────────────────────────────

    /// Capture the full ledger state with an integrity digest.
    pub fn snapshot(&self, now: Timestamp) -> LedgerSnapshot {
        LedgerSnapshot {
            hash: [0u8; 32],
            created_at: now,
            version: SNAPSHOT_VERSION,
            token: self.token.clone(),
            accounts: self.accounts(),
            treasury: self.treasury,
            total_staked: self.total_staked,
            total_minted: self.total_minted,
            genesis_issued: self.genesis_issued,
            holds: self.holds.values().cloned().collect(),
            next_hold_id: self.next_hold_id,
        }
        .seal()
    }

    /// Rebuild a ledger from a snapshot, rejecting tampered or unbalanced ones.
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Result<Self, LedgerError> {
        if !snapshot.verify() {
            return Err(LedgerError::SnapshotCorrupted);
        }
        let ledger = Self {
            token: snapshot.token.clone(),
            balances: snapshot.accounts.iter().cloned().collect(),
            treasury: snapshot.treasury,
            total_staked: snapshot.total_staked,
            total_minted: snapshot.total_minted,
            genesis_issued: snapshot.genesis_issued,
            holds: snapshot.holds.iter().map(|h| (h.id, h.clone())).collect(),
            next_hold_id: snapshot.next_hold_id,
        };
        ledger.audit()?;
        Ok(ledger)
    }

    /// Persist all ledger state to a store.
    ///
    /// Balances go to the account records; the sealed snapshot goes to one
    /// meta record and is what [`Ledger::load_from_store`] trusts.
    pub fn save_to_store<S>(&self, store: &S, now: Timestamp) -> Result<(), LedgerError>
    where
        S: AccountStore + MetaStore + ?Sized,
    {
        let snapshot = self.snapshot(now);
        for (address, balance) in &snapshot.accounts {
            let bytes =
                bincode::serialize(balance).map_err(|e| LedgerError::Serialization(e.to_string()))?;
            store.put_account(address, &bytes)?;
        }
        store.put_meta(META_KEY, &snapshot.to_bytes()?)?;
        tracing::debug!(
            digest = %snapshot.digest_hex(),
            accounts = snapshot.account_count(),
            "ledger snapshot written"
        );
        Ok(())
    }

    /// Restore ledger state from a store. `None` when the store holds no ledger.
    ///
    /// The snapshot digest must match, and every account record must agree
    /// with the snapshot.
    pub fn load_from_store<S>(store: &S) -> Result<Option<Self>, LedgerError>
    where
        S: AccountStore + MetaStore + ?Sized,
    {
        let snapshot = match store.get_meta(META_KEY)? {
            Some(bytes) => LedgerSnapshot::from_bytes(&bytes)?,
            None => return Ok(None),
        };
        let ledger = Self::from_snapshot(&snapshot)?;

        let mut records = 0usize;
        for (address, bytes) in store.iter_accounts()? {
            let balance: TokenAmount = bincode::deserialize(&bytes)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
            if ledger.balances.get(&address) != Some(&balance) {
                tracing::error!(%address, "account record disagrees with ledger snapshot");
                return Err(LedgerError::SnapshotCorrupted);
            }
            records += 1;
        }
        if records != ledger.balances.len() {
            return Err(LedgerError::SnapshotCorrupted);
        }

        tracing::debug!(
            digest = %snapshot.digest_hex(),
            created_at = %snapshot.created_at,
            "ledger snapshot verified"
        );
        Ok(Some(ledger))
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn debited_balance(
        &self,
        address: &Address,
        amount: TokenAmount,
    ) -> Result<TokenAmount, LedgerError> {
        let available = self.balance_of(address);
        available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            })
    }

    fn credited_balance(
        &self,
        address: &Address,
        amount: TokenAmount,
    ) -> Result<TokenAmount, LedgerError> {
        self.balance_of(address)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)
    }

    fn debited_treasury(&self, amount: TokenAmount) -> Result<TokenAmount, LedgerError> {
        self.treasury
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientTreasury {
                needed: amount,
                available: self.treasury,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdao_nullables::NullStore;

    fn addr(name: &str) -> Address {
        Address::new(name)
    }

    fn tokens(n: u64) -> TokenAmount {
        TokenAmount::from_tokens(n)
    }

    fn funded_ledger() -> Ledger {
        let config = GenesisConfig::default()
            .with_allocation("alice", tokens(10_000))
            .with_allocation("bob", tokens(500));
        Ledger::genesis(&config).unwrap()
    }

    #[test]
    fn unknown_address_has_zero_balance() {
        let ledger = funded_ledger();
        assert_eq!(ledger.balance_of(&addr("nobody")), TokenAmount::ZERO);
    }

    #[test]
    fn genesis_sets_treasury_and_circulating_supply() {
        let ledger = funded_ledger();
        assert_eq!(ledger.total_supply(), tokens(1_000_000_000));
        assert_eq!(ledger.treasury_balance(), tokens(100_000_000));
        assert_eq!(ledger.circulating_supply(), tokens(100_010_500));
        ledger.audit().unwrap();
    }

    #[test]
    fn transfer_moves_value() {
        let mut ledger = funded_ledger();
        ledger.transfer(&addr("alice"), &addr("carol"), tokens(2500)).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(7500));
        assert_eq!(ledger.balance_of(&addr("carol")), tokens(2500));
        ledger.audit().unwrap();
    }

    #[test]
    fn transfer_rejects_overdraft_without_side_effects() {
        let mut ledger = funded_ledger();
        let err = ledger
            .transfer(&addr("bob"), &addr("alice"), tokens(501))
            .unwrap_err();
        match err {
            LedgerError::InsufficientBalance { needed, available } => {
                assert_eq!(needed, tokens(501));
                assert_eq!(available, tokens(500));
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
        assert_eq!(ledger.balance_of(&addr("bob")), tokens(500));
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(10_000));
    }

    #[test]
    fn transfer_rejects_zero_amount() {
        let mut ledger = funded_ledger();
        assert!(matches!(
            ledger.transfer(&addr("alice"), &addr("bob"), TokenAmount::ZERO),
            Err(LedgerError::InvalidAmount)
        ));
    }

    #[test]
    fn self_transfer_is_a_no_op() {
        let mut ledger = funded_ledger();
        ledger.transfer(&addr("alice"), &addr("alice"), tokens(10)).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(10_000));
    }

    #[test]
    fn stake_lock_and_release_round_trip() {
        let mut ledger = funded_ledger();
        ledger.lock_stake(&addr("alice"), tokens(4000)).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(6000));
        assert_eq!(ledger.total_staked(), tokens(4000));
        ledger.audit().unwrap();

        ledger.release_stake(&addr("alice"), tokens(4000)).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(10_000));
        assert_eq!(ledger.total_staked(), TokenAmount::ZERO);
    }

    #[test]
    fn release_more_than_staked_fails() {
        let mut ledger = funded_ledger();
        assert!(matches!(
            ledger.release_stake(&addr("alice"), tokens(1)),
            Err(LedgerError::StakeUnderflow(_))
        ));
    }

    #[test]
    fn minted_reward_grows_supply_counters() {
        let mut ledger = funded_ledger();
        let before = ledger.circulating_supply();
        ledger.mint_reward(&addr("bob"), tokens(7)).unwrap();
        assert_eq!(ledger.balance_of(&addr("bob")), tokens(507));
        assert_eq!(ledger.total_minted(), tokens(7));
        assert_eq!(ledger.circulating_supply(), before.checked_add(tokens(7)).unwrap());
        ledger.audit().unwrap();
    }

    #[test]
    fn treasury_reward_requires_funds() {
        let config = GenesisConfig::new(TokenParams {
            total_supply: tokens(1000),
            ..TokenParams::default()
        });
        let mut ledger = Ledger::genesis(&config).unwrap();
        ledger.pay_reward_from_treasury(&addr("x"), tokens(100)).unwrap();
        assert!(matches!(
            ledger.pay_reward_from_treasury(&addr("x"), tokens(1)),
            Err(LedgerError::InsufficientTreasury { .. })
        ));
        ledger.audit().unwrap();
    }

    #[test]
    fn hold_commit_delivers_to_recipient() {
        let mut ledger = funded_ledger();
        let hold = ledger
            .place_hold("proposal-1", &addr("alice"), &addr("dave"), tokens(100), Timestamp::new(5))
            .unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(9900));
        assert_eq!(ledger.balance_of(&addr("dave")), TokenAmount::ZERO);
        ledger.audit().unwrap();

        ledger.commit_hold(hold.id).unwrap();
        assert_eq!(ledger.balance_of(&addr("dave")), tokens(100));
        assert_eq!(ledger.pending_holds().count(), 0);
        ledger.audit().unwrap();
    }

    #[test]
    fn hold_release_refunds_sender() {
        let mut ledger = funded_ledger();
        let hold = ledger
            .place_hold("proposal-1", &addr("alice"), &addr("dave"), tokens(100), Timestamp::new(5))
            .unwrap();
        ledger.release_hold(hold.id).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), tokens(10_000));
        assert!(matches!(
            ledger.release_hold(hold.id),
            Err(LedgerError::HoldNotFound(_))
        ));
    }

    #[test]
    fn snapshot_restores_identical_state() {
        let mut ledger = funded_ledger();
        ledger.lock_stake(&addr("alice"), tokens(1000)).unwrap();
        let snap = ledger.snapshot(Timestamp::new(42));
        let restored = Ledger::from_snapshot(&snap).unwrap();
        assert_eq!(restored.accounts(), ledger.accounts());
        assert_eq!(restored.total_staked(), tokens(1000));
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let ledger = funded_ledger();
        let mut snap = ledger.snapshot(Timestamp::new(42));
        snap.treasury = snap.treasury.checked_add(tokens(1)).unwrap();
        assert!(matches!(
            Ledger::from_snapshot(&snap),
            Err(LedgerError::SnapshotCorrupted)
        ));
    }

    #[test]
    fn store_round_trip_preserves_balances_and_holds() {
        let store = NullStore::new();
        let mut ledger = funded_ledger();
        ledger
            .place_hold("p", &addr("alice"), &addr("bob"), tokens(1), Timestamp::new(1))
            .unwrap();
        ledger.save_to_store(&store, Timestamp::new(7)).unwrap();

        let loaded = Ledger::load_from_store(&store).unwrap().expect("ledger stored");
        assert_eq!(loaded.accounts(), ledger.accounts());
        assert_eq!(loaded.pending_holds().count(), 1);
        assert_eq!(loaded.treasury_balance(), ledger.treasury_balance());
    }

    #[test]
    fn edited_account_record_fails_restore() {
        let store = NullStore::new();
        funded_ledger().save_to_store(&store, Timestamp::new(7)).unwrap();
        let forged = bincode::serialize(&tokens(9_999_999)).unwrap();
        store.put_account(&addr("bob"), &forged).unwrap();
        assert!(matches!(
            Ledger::load_from_store(&store),
            Err(LedgerError::SnapshotCorrupted)
        ));
    }

    #[test]
    fn edited_snapshot_record_fails_restore() {
        let store = NullStore::new();
        let ledger = funded_ledger();
        ledger.save_to_store(&store, Timestamp::new(7)).unwrap();
        let mut snapshot = ledger.snapshot(Timestamp::new(7));
        snapshot.treasury = TokenAmount::ZERO;
        store.put_meta(META_KEY, &snapshot.to_bytes().unwrap()).unwrap();
        assert!(matches!(
            Ledger::load_from_store(&store),
            Err(LedgerError::SnapshotCorrupted)
        ));
    }

    #[test]
    fn empty_store_loads_nothing() {
        let store = NullStore::new();
        assert!(Ledger::load_from_store(&store).unwrap().is_none());
    }
}
