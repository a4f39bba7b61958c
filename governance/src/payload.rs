//! Execution payloads.
//!
//! On the wire a payload is a flat object tagged by `type`:
//!
//! ```json
//! {"type": "transfer", "from_address": "treasury-ops", "to_address": "alice", "amount": "500"}
//! {"type": "parameter_change", "parameter": "quorum_bps", "value": 600}
//! {"type": "parameter_change", "parameter": "min_proposal_power", "value": "50000"}
//! ```
//!
//! A `value` may be a number or a string. For `min_proposal_power` it is a
//! token amount in the same form as `amount`; other parameters take plain
//! integers.
//!
//! Any other `type` decodes to [`ExecutionPayload::Unrecognized`] so that a
//! proposal carrying a newer payload kind can still be stored and voted on;
//! it fails only when executed.

use crate::error::GovernanceError;
use crate::params::GovernableParam;
use gdao_types::{Address, TokenAmount};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const TRANSFER: &str = "transfer";
pub const PARAMETER_CHANGE: &str = "parameter_change";

/// What a proposal does when executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPayload", into = "RawPayload")]
pub enum ExecutionPayload {
    /// Move tokens between two accounts.
    Transfer {
        from_address: Address,
        to_address: Address,
        amount: TokenAmount,
    },
    /// Set a governance parameter.
    ParameterChange {
        parameter: GovernableParam,
        value: u128,
    },
    /// A payload type this build does not know how to execute.
    Unrecognized { kind: String },
}

impl ExecutionPayload {
    /// The wire `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            Self::Transfer { .. } => TRANSFER,
            Self::ParameterChange { .. } => PARAMETER_CHANGE,
            Self::Unrecognized { kind } => kind,
        }
    }

    /// Reject payloads that can never execute, before anything is committed.
    pub fn check_executable(&self) -> Result<(), GovernanceError> {
        match self {
            Self::Transfer { amount, .. } if amount.is_zero() => {
                Err(GovernanceError::InvalidPayload("transfer amount is zero".to_string()))
            }
            Self::Transfer { .. } => Ok(()),
            Self::ParameterChange { parameter, value } => parameter.validate(*value),
            Self::Unrecognized { kind } => Err(GovernanceError::UnknownPayloadType(kind.clone())),
        }
    }
}

/// Flat wire shape. Every field is always present (as `null` when unused) so
/// the same shape works for self-describing and binary encodings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    from_address: Option<Address>,
    #[serde(default)]
    to_address: Option<Address>,
    #[serde(default)]
    amount: Option<TokenAmount>,
    #[serde(default)]
    parameter: Option<String>,
    #[serde(default)]
    value: Option<ParamValue>,
}

/// A parameter value as written on the wire, before it is scaled for its
/// parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ParamValue {
    Number(u128),
    Text(String),
}

impl ParamValue {
    fn for_param(parameter: GovernableParam, value: u128) -> Self {
        match parameter {
            GovernableParam::MinProposalPower => Self::Text(TokenAmount::new(value).to_string()),
            _ => Self::Number(value),
        }
    }

    /// The value in the units [`GovernableParam::apply`] expects.
    fn resolve(self, parameter: GovernableParam) -> Result<u128, GovernanceError> {
        let invalid = |text: &str| {
            GovernanceError::InvalidPayload(format!("invalid value {text:?} for {parameter}"))
        };
        match (parameter, self) {
            (GovernableParam::MinProposalPower, Self::Number(tokens)) => tokens
                .checked_mul(gdao_types::TOKEN_UNIT)
                .ok_or_else(|| invalid(&tokens.to_string())),
            (GovernableParam::MinProposalPower, Self::Text(text)) => text
                .parse::<TokenAmount>()
                .map(|amount| amount.raw())
                .map_err(|_| invalid(&text)),
            (_, Self::Number(value)) => Ok(value),
            (_, Self::Text(text)) => text.trim().parse::<u128>().map_err(|_| invalid(&text)),
        }
    }
}

/// Binary encodings are not self-describing, so they carry the variant.
#[derive(Serialize, Deserialize)]
enum TaggedValue {
    Number(u128),
    Text(String),
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            match self {
                Self::Number(n) => match u64::try_from(*n) {
                    Ok(small) => serializer.serialize_u64(small),
                    Err(_) => serializer.serialize_str(&n.to_string()),
                },
                Self::Text(text) => serializer.serialize_str(text),
            }
        } else {
            let tagged = match self {
                Self::Number(n) => TaggedValue::Number(*n),
                Self::Text(text) => TaggedValue::Text(text.clone()),
            };
            tagged.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            // `deserialize_any` keeps this working inside buffered
            // (internally tagged) containers, which cannot produce a u128.
            deserializer.deserialize_any(ParamValueVisitor)
        } else {
            Ok(match TaggedValue::deserialize(deserializer)? {
                TaggedValue::Number(n) => Self::Number(n),
                TaggedValue::Text(text) => Self::Text(text),
            })
        }
    }
}

struct ParamValueVisitor;

impl<'de> Visitor<'de> for ParamValueVisitor {
    type Value = ParamValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ParamValue::Number(v as u128))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(ParamValue::Number(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .map(|v| ParamValue::Number(v as u128))
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ParamValue::Text(v.to_string()))
    }
}

fn missing(kind: &str, field: &str) -> GovernanceError {
    GovernanceError::InvalidPayload(format!("{kind} payload is missing {field}"))
}

impl TryFrom<RawPayload> for ExecutionPayload {
    type Error = GovernanceError;

    fn try_from(raw: RawPayload) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            TRANSFER => Ok(Self::Transfer {
                from_address: raw.from_address.ok_or_else(|| missing(TRANSFER, "from_address"))?,
                to_address: raw.to_address.ok_or_else(|| missing(TRANSFER, "to_address"))?,
                amount: raw.amount.ok_or_else(|| missing(TRANSFER, "amount"))?,
            }),
            PARAMETER_CHANGE => {
                let name = raw.parameter.ok_or_else(|| missing(PARAMETER_CHANGE, "parameter"))?;
                let parameter: GovernableParam = name.parse()?;
                let value = raw.value.ok_or_else(|| missing(PARAMETER_CHANGE, "value"))?;
                Ok(Self::ParameterChange {
                    parameter,
                    value: value.resolve(parameter)?,
                })
            }
            _ => Ok(Self::Unrecognized { kind: raw.kind }),
        }
    }
}

impl From<ExecutionPayload> for RawPayload {
    fn from(payload: ExecutionPayload) -> Self {
        match payload {
            ExecutionPayload::Transfer {
                from_address,
                to_address,
                amount,
            } => Self {
                kind: TRANSFER.to_string(),
                from_address: Some(from_address),
                to_address: Some(to_address),
                amount: Some(amount),
                ..Self::default()
            },
            ExecutionPayload::ParameterChange { parameter, value } => Self {
                kind: PARAMETER_CHANGE.to_string(),
                parameter: Some(parameter.name().to_string()),
                value: Some(ParamValue::for_param(parameter, value)),
                ..Self::default()
            },
            ExecutionPayload::Unrecognized { kind } => Self {
                kind,
                ..Self::default()
            },
        }
    }
}
