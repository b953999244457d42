use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Key prefix of every party's transfer log.
pub const TRANSFER_LOG_PREFIX: &str = "transfer-log:";

/// Type of a header chain event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// The entity was created.
    Create,
    /// A processed good was derived from this entity.
    Transform,
    /// Custody of this entity moved between parties.
    Transfer,
    /// A packaged good was derived from this entity.
    Package,
    /// This entity was grouped into a batch.
    Batch,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "Create"),
            Self::Transform => write!(f, "Transform"),
            Self::Transfer => write!(f, "Transfer"),
            Self::Package => write!(f, "Package"),
            Self::Batch => write!(f, "Batch"),
        }
    }
}

impl FromStr for EventType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "transform" => Ok(Self::Transform),
            "transfer" => Ok(Self::Transfer),
            "package" => Ok(Self::Package),
            "batch" => Ok(Self::Batch),
            _ => Err(TypeError::UnknownEventType(s.to_string())),
        }
    }
}

/// One entry of a header chain.
///
/// `link_reference` is an opaque caller annotation. It is stored verbatim and
/// never interpreted or checked against earlier events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent {
    pub block: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub value: String,
    pub link_reference: String,
}

impl ChainEvent {
    pub fn new(
        block: impl Into<String>,
        kind: EventType,
        value: impl Into<String>,
        link_reference: impl Into<String>,
    ) -> Self {
        Self {
            block: block.into(),
            kind,
            value: value.into(),
            link_reference: link_reference.into(),
        }
    }
}

/// A custody transfer as recorded in both parties' transfer logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Tag/id of the transferred item.
    pub id: String,
    pub value: String,
    pub description: String,
    pub from: String,
    pub to: String,
    pub date: String,
}

impl TransferRecord {
    /// Key of the transfer log kept for `party`.
    pub fn log_key(party: &str) -> String {
        format!("{TRANSFER_LOG_PREFIX}{party}")
    }
}
