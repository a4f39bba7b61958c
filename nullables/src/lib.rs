//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the core (wall-clock time, on-chain
//! settlement, durable storage) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod settlement;
pub mod store;

pub use clock::NullClock;
pub use settlement::NullSettlement;
pub use store::NullStore;
