//! GDAO node: the atomic operation surface over every engine.
//!
//! The node is the central coordinator that:
//! - Serializes every mutation of the ledger, staking and governance engines
//! - Settles executed transfer proposals through the settlement collaborator
//! - Publishes events and Prometheus metrics for each state change
//! - Optionally sweeps open proposals on a timer
//! - Checkpoints and restores engine state through the store traits

pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;
pub mod tracing_spans;

pub use command::{reply, Command};
pub use config::NodeConfig;
pub use error::NodeError;
pub use events::{DaoEvent, EventBus};
pub use logging::{init_logging, LogFormat};
pub use metrics::DaoMetrics;
pub use node::DaoNode;
pub use shutdown::{ShutdownController, ShutdownSignal};
