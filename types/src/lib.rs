//! Fundamental types for the GDAO governance-and-staking ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, fixed-point amounts, timestamps and clocks, policy parameters, and the
//! outbound settlement capability.

pub mod address;
pub mod amount;
pub mod environment;
pub mod error;
pub mod params;
pub mod settlement;
pub mod time;

pub use address::Address;
pub use amount::{TokenAmount, BPS_DENOMINATOR, TOKEN_DECIMALS, TOKEN_UNIT};
pub use environment::Environment;
pub use error::TypesError;
pub use params::{GovernanceParams, TokenParams};
pub use settlement::{Settlement, SettlementError, SettlementRequest, TransactionId};
pub use time::{Clock, SystemClock, Timestamp};
