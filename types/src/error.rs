//! Parse errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid token amount: {0:?}")]
    InvalidAmount(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
}
