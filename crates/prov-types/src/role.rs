use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Role held by an actor in the supply chain.
///
/// Creation of each entity kind is reserved for exactly one role; see
/// [`EntityKind::required_role`](crate::EntityKind::required_role).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// Regulator overseeing the chain.
    Authority,
    /// Turns processed goods into packaged product.
    Manufacturer,
    /// Raises and registers animals.
    Farmer,
    /// Sells packaged product.
    Retailer,
    /// Turns animals into processed goods.
    Slaughterhouse,
}

impl RoleKind {
    /// All roles in declaration order.
    pub const ALL: [RoleKind; 5] = [
        Self::Authority,
        Self::Manufacturer,
        Self::Farmer,
        Self::Retailer,
        Self::Slaughterhouse,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authority => "authority",
            Self::Manufacturer => "manufacturer",
            Self::Farmer => "farmer",
            Self::Retailer => "retailer",
            Self::Slaughterhouse => "slaughterhouse",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = TypeError;

    /// Parses canonical names case-insensitively. `regulator` and `walmart`
    /// are accepted as legacy aliases for authority and retailer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authority" | "regulator" => Ok(Self::Authority),
            "manufacturer" => Ok(Self::Manufacturer),
            "farmer" => Ok(Self::Farmer),
            "retailer" | "walmart" => Ok(Self::Retailer),
            "slaughterhouse" => Ok(Self::Slaughterhouse),
            _ => Err(TypeError::UnknownRole(s.to_string())),
        }
    }
}

/// The calling party of one request, as yielded by an identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Party name; transfer logs are keyed by it.
    pub name: String,
    pub role: RoleKind,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: RoleKind) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}
