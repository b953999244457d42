//! Primary records for each tracked entity kind.
//!
//! Each record is created exactly once and never rewritten afterwards; all
//! later history lives in the entity's header chain.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entity::{ChainKey, EntityKind};

/// A record stored under its own primary key.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    /// Primary key (tag or id) of this record.
    fn key(&self) -> &str;

    fn chain_key(&self) -> ChainKey {
        Self::KIND.chain_key(self.key())
    }
}

/// A live animal registered by a farmer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAnimal {
    pub species: String,
    #[serde(rename = "type")]
    pub animal_type: String,
    pub id: String,
    pub tag: String,
    pub birthdate: String,
    pub weight: f64,
    pub custodian_id: String,
    pub status: String,
    pub certificate: String,
}

impl Entity for TrackedAnimal {
    const KIND: EntityKind = EntityKind::Animal;

    fn key(&self) -> &str {
        &self.tag
    }
}

/// Meat derived from an animal by a slaughterhouse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedGood {
    pub id: String,
    pub weight: f64,
    pub created_date: String,
    /// Tag of the source [`TrackedAnimal`].
    pub source_tag: String,
    pub expire_date: String,
    pub temperature: f64,
    pub company_id: String,
    pub certificate: String,
}

impl Entity for ProcessedGood {
    const KIND: EntityKind = EntityKind::ProcessedGood;

    fn key(&self) -> &str {
        &self.id
    }
}

/// Packaged product derived from a processed good by a manufacturer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagedGood {
    pub id: String,
    pub weight: f64,
    pub created_date: String,
    /// Id of the source [`ProcessedGood`].
    pub source_tag: String,
    pub expire_date: String,
    pub temperature: f64,
    pub company_id: String,
    pub preservation_process: String,
    pub certificate: String,
    pub package_type: String,
    pub product_state: String,
    pub cut_name: String,
}

impl Entity for PackagedGood {
    const KIND: EntityKind = EntityKind::PackagedGood;

    fn key(&self) -> &str {
        &self.id
    }
}

/// A custodian's submission grouping several tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub batch_id: String,
    pub tags: Vec<String>,
    /// Chain key of the batch itself.
    pub chain_key: ChainKey,
    pub date: String,
    pub custodian_id: String,
    pub source_chain_key: String,
}

impl Entity for Batch {
    const KIND: EntityKind = EntityKind::Batch;

    fn key(&self) -> &str {
        &self.batch_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal() -> TrackedAnimal {
        TrackedAnimal {
            species: "bovine".into(),
            animal_type: "angus".into(),
            id: "A1".into(),
            tag: "T01".into(),
            birthdate: "2024-03-01".into(),
            weight: 412.5,
            custodian_id: "FarmerA".into(),
            status: "alive".into(),
            certificate: "organic".into(),
        }
    }

    #[test]
    fn animal_is_keyed_by_tag() {
        let a = animal();
        assert_eq!(a.key(), "T01");
        assert_eq!(a.chain_key().as_str(), "animal-T01");
    }

    #[test]
    fn animal_field_names_are_camel_case() {
        let json = serde_json::to_value(animal()).unwrap();
        assert_eq!(json["custodianId"], "FarmerA");
        assert_eq!(json["type"], "angus");
        assert_eq!(json["weight"], 412.5);
    }

    #[test]
    fn batch_chain_key_serializes_as_string() {
        let batch = Batch {
            batch_id: "B1".into(),
            tags: vec!["T01".into(), "T02".into()],
            chain_key: EntityKind::Batch.chain_key("B1"),
            date: "2024-05-01".into(),
            custodian_id: "coop".into(),
            source_chain_key: "animal-T01".into(),
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["chainKey"], "batch-B1");
        assert_eq!(json["tags"][1], "T02");
    }
}
