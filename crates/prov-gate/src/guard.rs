use tracing::{debug, Span};

use prov_types::{Actor, EntityKind, RoleKind};

use crate::error::{GateError, GateResult};
use crate::policy::TransferPolicy;

/// Pure role checks run before any write.
///
/// The guard never touches the store; a rejected request therefore cannot
/// leave a partial write behind.
#[derive(Clone, Debug)]
pub struct PermissionGuard {
    transfer_policy: TransferPolicy,
    span: Span,
}

impl PermissionGuard {
    pub fn new(span: Span, transfer_policy: TransferPolicy) -> Self {
        Self {
            transfer_policy,
            span,
        }
    }

    pub fn transfer_policy(&self) -> TransferPolicy {
        self.transfer_policy
    }

    /// Fails unless `actor` holds exactly `required`.
    pub fn require_role(&self, actor: &Actor, required: RoleKind) -> GateResult<()> {
        if actor.role == required {
            return Ok(());
        }
        debug!(parent: &self.span, actor = %actor, %required, "role check failed");
        Err(GateError::Permission {
            actor: actor.name.clone(),
            required,
        })
    }

    /// Role check for creating an entity of `kind`. Kinds without a required
    /// role are open to every actor.
    pub fn require_for(&self, actor: &Actor, kind: EntityKind) -> GateResult<()> {
        match kind.required_role() {
            Some(required) => self.require_role(actor, required),
            None => Ok(()),
        }
    }

    /// Whether `actor` may record a transfer out of `from`'s custody.
    /// Roles play no part here.
    pub fn authorize_transfer(&self, actor: &Actor, from: &str) -> GateResult<()> {
        match self.transfer_policy {
            TransferPolicy::Open => Ok(()),
            TransferPolicy::SenderMustMatch if actor.name == from => Ok(()),
            TransferPolicy::SenderMustMatch => {
                debug!(parent: &self.span, actor = %actor, from, "transfer sender mismatch");
                Err(GateError::NotSender {
                    actor: actor.name.clone(),
                    from: from.to_string(),
                })
            }
        }
    }
}

impl Default for PermissionGuard {
    fn default() -> Self {
        Self::new(Span::none(), TransferPolicy::default())
    }
}
