use prov_chain::ChainError;
use prov_gate::GateError;
use prov_store::StoreError;
use prov_types::TypeError;

/// Errors surfaced to callers of the ledger.
///
/// Every variant maps to a stable [`kind`](Self::kind) string. The store's
/// `Absent` signal never reaches this type unconverted: creation paths treat
/// it as empty and reads of unknown items report [`Validation`](Self::Validation).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Malformed or missing argument, unknown command, or unknown item.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("permission denied: {0}")]
    Permission(String),

    /// Creation key already occupied.
    #[error("conflict: {0} already exists")]
    Conflict(String),

    /// A present value failed to decode.
    #[error("corrupt record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    /// Backend failure (I/O, encoding, poisoned lock, stopped service).
    #[error("store error: {0}")]
    Store(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Permission(_) => "permission",
            Self::Conflict(_) => "conflict",
            Self::CorruptRecord { .. } => "corrupt-record",
            Self::Store(_) => "store",
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Absent(key) => Self::Validation(format!("unknown item {key}")),
            StoreError::Corrupt { key, reason } => Self::CorruptRecord { key, reason },
            StoreError::Conflict(key) => Self::Conflict(key),
            err @ StoreError::KindMismatch { .. } => Self::Validation(err.to_string()),
            err @ (StoreError::Serialization(_) | StoreError::Io(_) | StoreError::Poisoned) => {
                Self::Store(err.to_string())
            }
        }
    }
}

impl From<ChainError> for LedgerError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Store(inner) => inner.into(),
            ChainError::EmptyMember(collection) => {
                Self::Validation(format!("empty member for {collection}"))
            }
            err @ ChainError::Serialization(_) => Self::Store(err.to_string()),
        }
    }
}

impl From<GateError> for LedgerError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::UnknownRole(role) => Self::Validation(format!("unknown role: {role}")),
            GateError::Permission { actor, required } => {
                Self::Permission(format!("{actor} requires role {required}"))
            }
            GateError::NotSender { actor, from } => {
                Self::Permission(format!("{actor} cannot transfer on behalf of {from}"))
            }
            GateError::Identity(msg) => Self::Permission(msg),
        }
    }
}

impl From<TypeError> for LedgerError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
