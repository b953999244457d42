use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::event::TRANSFER_LOG_PREFIX;
use crate::role::RoleKind;

/// Kind of tracked entity.
///
/// The kind fixes three things: the header chain prefix, the global registry
/// that lists every created key, and the role allowed to create it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Animal,
    ProcessedGood,
    PackagedGood,
    Batch,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        Self::Animal,
        Self::ProcessedGood,
        Self::PackagedGood,
        Self::Batch,
    ];

    /// Prefix used when deriving this kind's chain keys.
    pub fn chain_prefix(&self) -> &'static str {
        match self {
            Self::Animal => "animal",
            Self::ProcessedGood => "processed",
            Self::PackagedGood => "package",
            Self::Batch => "batch",
        }
    }

    /// Well-known key of the global registry for this kind.
    ///
    /// Batches have no global registry; they are listed per custodian.
    pub fn registry_key(&self) -> Option<&'static str> {
        match self {
            Self::Animal => Some("animal-ids"),
            Self::ProcessedGood => Some("processed-ids"),
            Self::PackagedGood => Some("package-ids"),
            Self::Batch => None,
        }
    }

    /// Key prefix of the per-custodian registries, for kinds that keep them.
    pub fn custodian_list_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Animal => Some("animal-list:"),
            Self::Batch => Some("batch-list:"),
            Self::ProcessedGood | Self::PackagedGood => None,
        }
    }

    /// Key of the per-custodian registry, for kinds that keep one.
    pub fn custodian_list_key(&self, custodian: &str) -> Option<String> {
        self.custodian_list_prefix()
            .map(|prefix| format!("{prefix}{custodian}"))
    }

    /// Role that may create this kind, or `None` when creation is open.
    pub fn required_role(&self) -> Option<RoleKind> {
        match self {
            Self::Animal => Some(RoleKind::Farmer),
            Self::ProcessedGood => Some(RoleKind::Slaughterhouse),
            Self::PackagedGood => Some(RoleKind::Manufacturer),
            Self::Batch => None,
        }
    }

    /// Derive the header chain key for `tag` under this kind.
    pub fn chain_key(&self, tag: &str) -> ChainKey {
        ChainKey::derive(*self, tag)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.chain_prefix())
    }
}

impl FromStr for EntityKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "animal" | "cattle" => Ok(Self::Animal),
            "processed" | "processed-good" | "processedgood" => Ok(Self::ProcessedGood),
            "package" | "packaged-good" | "packagedgood" => Ok(Self::PackagedGood),
            "batch" => Ok(Self::Batch),
            _ => Err(TypeError::UnknownKind(s.to_string())),
        }
    }
}

/// Names the bookkeeping key family `key` belongs to, if any.
///
/// Entity records share one flat key space with registries, header chains and
/// transfer logs, so an entity key must not take any of these forms.
pub fn reserved_form(key: &str) -> Option<&'static str> {
    for kind in EntityKind::ALL {
        if kind.registry_key() == Some(key) {
            return Some("registry key");
        }
        if kind
            .custodian_list_prefix()
            .is_some_and(|prefix| key.starts_with(prefix))
        {
            return Some("custodian list key");
        }
        if key
            .strip_prefix(kind.chain_prefix())
            .is_some_and(|rest| rest.starts_with('-'))
        {
            return Some("chain key");
        }
    }
    if key.starts_with(TRANSFER_LOG_PREFIX) {
        return Some("transfer log key");
    }
    None
}

/// Key of a per-entity header chain: `<kind prefix>-<tag>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainKey(String);

impl ChainKey {
    /// Pure derivation from kind and tag.
    pub fn derive(kind: EntityKind, tag: &str) -> Self {
        Self(format!("{}-{}", kind.chain_prefix(), tag))
    }

    /// Split a chain key back into its kind and tag.
    ///
    /// Prefixes never contain `-`, so the first `-` is the separator and the
    /// tag itself may contain dashes.
    pub fn parse(s: &str) -> Result<(EntityKind, String), TypeError> {
        let (prefix, tag) = s
            .split_once('-')
            .ok_or_else(|| TypeError::InvalidChainKey(s.to_string()))?;
        let kind = EntityKind::ALL
            .into_iter()
            .find(|k| k.chain_prefix() == prefix)
            .ok_or_else(|| TypeError::InvalidChainKey(s.to_string()))?;
        if tag.is_empty() {
            return Err(TypeError::InvalidChainKey(s.to_string()));
        }
        Ok((kind, tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChainKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_key_derivation_is_prefix_dash_tag() {
        assert_eq!(EntityKind::Animal.chain_key("T01").as_str(), "animal-T01");
        assert_eq!(
            EntityKind::ProcessedGood.chain_key("RM01").as_str(),
            "processed-RM01"
        );
        assert_eq!(
            EntityKind::PackagedGood.chain_key("FP01").as_str(),
            "package-FP01"
        );
        assert_eq!(EntityKind::Batch.chain_key("B7").as_str(), "batch-B7");
    }

    #[test]
    fn chain_key_parse_keeps_dashes_in_tag() {
        let (kind, tag) = ChainKey::parse("animal-T-01-a").unwrap();
        assert_eq!(kind, EntityKind::Animal);
        assert_eq!(tag, "T-01-a");
    }

    #[test]
    fn chain_key_parse_rejects_unknown_prefix() {
        assert!(ChainKey::parse("cow-T01").is_err());
        assert!(ChainKey::parse("animal").is_err());
        assert!(ChainKey::parse("animal-").is_err());
    }

    #[test]
    fn role_table() {
        assert_eq!(EntityKind::Animal.required_role(), Some(RoleKind::Farmer));
        assert_eq!(
            EntityKind::ProcessedGood.required_role(),
            Some(RoleKind::Slaughterhouse)
        );
        assert_eq!(
            EntityKind::PackagedGood.required_role(),
            Some(RoleKind::Manufacturer)
        );
        assert_eq!(EntityKind::Batch.required_role(), None);
    }

    #[test]
    fn registry_keys() {
        assert_eq!(EntityKind::Animal.registry_key(), Some("animal-ids"));
        assert_eq!(EntityKind::Batch.registry_key(), None);
        assert_eq!(
            EntityKind::Batch.custodian_list_key("coop").as_deref(),
            Some("batch-list:coop")
        );
        assert_eq!(EntityKind::PackagedGood.custodian_list_key("x"), None);
    }

    #[test]
    fn reserved_forms() {
        assert_eq!(reserved_form("processed-ids"), Some("registry key"));
        assert_eq!(reserved_form("animal-ids"), Some("registry key"));
        assert_eq!(reserved_form("processed-RM01"), Some("chain key"));
        assert_eq!(reserved_form("batch-B1"), Some("chain key"));
        assert_eq!(reserved_form("animal-list:FarmerA"), Some("custodian list key"));
        assert_eq!(reserved_form("batch-list:coop"), Some("custodian list key"));
        assert_eq!(reserved_form("transfer-log:FarmerA"), Some("transfer log key"));

        for free in ["T01", "RM01", "animal", "batchB1", "Animal-T01", "T-01"] {
            assert_eq!(reserved_form(free), None, "{free}");
        }
    }

    #[test]
    fn parse_kind_names() {
        assert_eq!("animal".parse::<EntityKind>().unwrap(), EntityKind::Animal);
        assert_eq!(
            "processed".parse::<EntityKind>().unwrap(),
            EntityKind::ProcessedGood
        );
        assert_eq!(
            "Package".parse::<EntityKind>().unwrap(),
            EntityKind::PackagedGood
        );
        assert!("widget".parse::<EntityKind>().is_err());
    }
}
