use prov_store::StoreError;

/// Errors produced by registry, chain, and transfer log operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("empty member key for {0}")]
    EmptyMember(String),
}

/// Result alias for this crate.
pub type ChainResult<T> = Result<T, ChainError>;
