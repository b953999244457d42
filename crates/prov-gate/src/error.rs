use prov_types::RoleKind;

/// Errors raised by the permission gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The actor's role does not match the role the operation requires.
    #[error("permission denied: {actor} requires role {required}")]
    Permission { actor: String, required: RoleKind },

    /// The actor is not allowed to move an item out of another party's custody.
    #[error("permission denied: {actor} cannot transfer on behalf of {from}")]
    NotSender { actor: String, from: String },

    /// A role attribute did not name a known role.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// The identity provider could not produce an actor.
    #[error("identity unavailable: {0}")]
    Identity(String),
}

pub type GateResult<T> = Result<T, GateError>;
