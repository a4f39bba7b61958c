//! Deployment environment.

use crate::error::TypesError;
use crate::params::GovernanceParams;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which environment the process runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Automated and manual testing; governance timelines are shortened.
    Testing,
    /// The production deployment.
    Production,
}

impl Environment {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }

    /// Governance policy to start from in this environment.
    pub fn governance_params(&self) -> GovernanceParams {
        match self {
            Self::Testing => GovernanceParams::testing(),
            Self::Development | Self::Production => GovernanceParams::default(),
        }
    }
}

impl FromStr for Environment {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "testing" | "test" => Ok(Self::Testing),
            "production" | "prod" => Ok(Self::Production),
            other => Err(TypesError::UnknownEnvironment(other.to_string())),
        }
    }
}
