//! Token balance ledger.
//!
//! Owns account balances, the treasury and the supply counters. Every
//! mutation either applies completely or not at all, and the ledger can
//! prove conservation of value at any point with [`Ledger::audit`].

pub mod error;
pub mod genesis;
pub mod hold;
pub mod ledger;
pub mod snapshot;

pub use error::LedgerError;
pub use genesis::{Allocation, GenesisConfig};
pub use hold::{Hold, HoldId};
pub use ledger::{Ledger, TokenInfo};
pub use snapshot::LedgerSnapshot;
