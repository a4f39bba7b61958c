//! Repository contract for the GDAO core.
//!
//! Every storage backend (a SQL database, an embedded KV store, in-memory for
//! testing) implements these traits. The engines depend only on the traits and
//! serialize their own records, so this crate never depends on engine types.
//!
//! Backends must enforce the invariants that belong at the storage boundary:
//! one vote per `(proposal, voter)` pair and unique entity ids.

pub mod account;
pub mod error;
pub mod governance;
pub mod meta;
pub mod staking;

pub use account::AccountStore;
pub use error::StoreError;
pub use governance::GovernanceStore;
pub use meta::MetaStore;
pub use staking::StakingStore;

/// A backend that holds every entity the core owns.
pub trait DaoStore: AccountStore + StakingStore + GovernanceStore + MetaStore {}

impl<T: AccountStore + StakingStore + GovernanceStore + MetaStore> DaoStore for T {}
