use thiserror::Error;

/// Errors produced when parsing or validating foundation types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("invalid chain key: {0}")]
    InvalidChainKey(String),

    #[error("empty identifier for {0}")]
    EmptyIdentifier(&'static str),
}
