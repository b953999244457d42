use std::collections::HashMap;

use prov_types::{Actor, RoleKind};

use crate::error::{GateError, GateResult};

/// Attribute naming the caller in a certificate-style attribute set.
pub const NAME_ATTRIBUTE: &str = "username";
/// Attribute carrying the caller's role.
pub const ROLE_ATTRIBUTE: &str = "role";

/// Source of the calling actor for a request.
pub trait IdentityProvider: Send + Sync {
    fn actor(&self) -> GateResult<Actor>;
}

/// Always yields the same actor. Used by the CLI and in tests.
#[derive(Clone, Debug)]
pub struct StaticIdentity(Actor);

impl StaticIdentity {
    pub fn new(actor: Actor) -> Self {
        Self(actor)
    }
}

impl IdentityProvider for StaticIdentity {
    fn actor(&self) -> GateResult<Actor> {
        Ok(self.0.clone())
    }
}

/// Identity read from a flat attribute map, as carried by an enrollment
/// certificate. Requires `username` and `role`.
#[derive(Clone, Debug, Default)]
pub struct AttributeIdentity {
    attributes: HashMap<String, String>,
}

impl AttributeIdentity {
    pub fn new(attributes: HashMap<String, String>) -> Self {
        Self { attributes }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    fn attribute(&self, key: &str) -> GateResult<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GateError::Identity(format!("missing attribute '{key}'")))
    }
}

impl IdentityProvider for AttributeIdentity {
    fn actor(&self) -> GateResult<Actor> {
        let name = self.attribute(NAME_ATTRIBUTE)?;
        let role_text = self.attribute(ROLE_ATTRIBUTE)?;
        let role: RoleKind = role_text
            .parse()
            .map_err(|_| GateError::UnknownRole(role_text.to_string()))?;
        Ok(Actor::new(name, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_identity_returns_actor() {
        let id = StaticIdentity::new(Actor::new("FarmerA", RoleKind::Farmer));
        assert_eq!(id.actor().unwrap().name, "FarmerA");
    }

    #[test]
    fn attribute_identity_reads_name_and_role() {
        let id = AttributeIdentity::default()
            .with("username", "Walmart01")
            .with("role", "walmart");
        let actor = id.actor().unwrap();
        assert_eq!(actor.name, "Walmart01");
        assert_eq!(actor.role, RoleKind::Retailer);
    }

    #[test]
    fn missing_or_blank_attribute_is_identity_error() {
        let id = AttributeIdentity::default().with("role", "farmer");
        assert!(matches!(id.actor().unwrap_err(), GateError::Identity(_)));

        let id = AttributeIdentity::default()
            .with("username", " ")
            .with("role", "farmer");
        assert!(matches!(id.actor().unwrap_err(), GateError::Identity(_)));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let id = AttributeIdentity::default()
            .with("username", "X")
            .with("role", "baker");
        assert_eq!(id.actor().unwrap_err(), GateError::UnknownRole("baker".into()));
    }
}
