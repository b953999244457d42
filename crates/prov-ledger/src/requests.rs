//! Named request records, one per mutating operation.
//!
//! The command registry binds positional arguments into these; the ledger
//! consumes them directly.

use serde::{Deserialize, Serialize};

use prov_types::{
    reserved_form, Batch, ChainKey, EntityKind, PackagedGood, ProcessedGood, TrackedAnimal,
};

use crate::error::{LedgerError, LedgerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnimal {
    pub species: String,
    pub animal_type: String,
    pub id: String,
    pub tag: String,
    pub birthdate: String,
    pub weight: f64,
    pub custodian_id: String,
    pub status: String,
    pub block: String,
    /// Value of the initial `Create` event; the tag when empty.
    pub value: String,
    pub link_reference: String,
    pub certificate: String,
}

impl CreateAnimal {
    pub(crate) fn validate(&self) -> LedgerResult<()> {
        require_entity_key("tag", &self.tag)?;
        require_non_empty("custodianId", &self.custodian_id)?;
        require_finite("weight", self.weight)
    }

    pub(crate) fn record(&self) -> TrackedAnimal {
        TrackedAnimal {
            species: self.species.clone(),
            animal_type: self.animal_type.clone(),
            id: self.id.clone(),
            tag: self.tag.clone(),
            birthdate: self.birthdate.clone(),
            weight: self.weight,
            custodian_id: self.custodian_id.clone(),
            status: self.status.clone(),
            certificate: self.certificate.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessedGood {
    pub id: String,
    pub weight: f64,
    pub created_date: String,
    /// Tag of the source animal.
    pub source_tag: String,
    pub expire_date: String,
    pub temperature: f64,
    pub company_id: String,
    pub certificate: String,
    pub block: String,
    pub link_reference: String,
}

impl CreateProcessedGood {
    pub(crate) fn validate(&self) -> LedgerResult<()> {
        require_entity_key("id", &self.id)?;
        require_non_empty("sourceTag", &self.source_tag)?;
        require_finite("weight", self.weight)?;
        require_finite("temperature", self.temperature)
    }

    pub(crate) fn record(&self) -> ProcessedGood {
        ProcessedGood {
            id: self.id.clone(),
            weight: self.weight,
            created_date: self.created_date.clone(),
            source_tag: self.source_tag.clone(),
            expire_date: self.expire_date.clone(),
            temperature: self.temperature,
            company_id: self.company_id.clone(),
            certificate: self.certificate.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackagedGood {
    pub id: String,
    pub weight: f64,
    pub created_date: String,
    /// Id of the source processed good.
    pub source_tag: String,
    pub expire_date: String,
    pub temperature: f64,
    pub company_id: String,
    pub preservation_process: String,
    pub certificate: String,
    pub package_type: String,
    pub product_state: String,
    pub cut_name: String,
    pub block: String,
    /// Value of the initial `Create` event; the id when empty.
    pub value: String,
    pub link_reference: String,
    /// Animal chain to link, as a chain key or bare tag. Optional when the
    /// source processed good is on record.
    pub source_chain_key: String,
}

impl CreatePackagedGood {
    pub(crate) fn validate(&self) -> LedgerResult<()> {
        require_entity_key("id", &self.id)?;
        require_non_empty("sourceTag", &self.source_tag)?;
        require_finite("weight", self.weight)?;
        require_finite("temperature", self.temperature)
    }

    pub(crate) fn record(&self) -> PackagedGood {
        PackagedGood {
            id: self.id.clone(),
            weight: self.weight,
            created_date: self.created_date.clone(),
            source_tag: self.source_tag.clone(),
            expire_date: self.expire_date.clone(),
            temperature: self.temperature,
            company_id: self.company_id.clone(),
            preservation_process: self.preservation_process.clone(),
            certificate: self.certificate.clone(),
            package_type: self.package_type.clone(),
            product_state: self.product_state.clone(),
            cut_name: self.cut_name.clone(),
        }
    }

    /// The animal chain named by `source_chain_key`, if any.
    pub(crate) fn named_animal_chain(&self) -> LedgerResult<Option<ChainKey>> {
        let named = self.source_chain_key.trim();
        if named.is_empty() {
            return Ok(None);
        }
        match ChainKey::parse(named) {
            Ok((EntityKind::Animal, tag)) => Ok(Some(EntityKind::Animal.chain_key(&tag))),
            Ok((kind, _)) => Err(LedgerError::validation(format!(
                "sourceChainKey {named} is a {kind} chain, expected an animal chain"
            ))),
            Err(_) => Ok(Some(EntityKind::Animal.chain_key(named))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatch {
    pub custodian_id: String,
    pub batch_id: String,
    pub tags: Vec<String>,
    pub date: String,
    pub source_chain_key: String,
    pub block: String,
}

impl CreateBatch {
    pub(crate) fn validate(&self) -> LedgerResult<()> {
        require_non_empty("custodianId", &self.custodian_id)?;
        require_entity_key("batchId", &self.batch_id)?;
        if self.tags.is_empty() {
            return Err(LedgerError::validation("tagList must name at least one tag"));
        }
        for (i, tag) in self.tags.iter().enumerate() {
            require_non_empty("tagList entry", tag)?;
            if self.tags[..i].contains(tag) {
                return Err(LedgerError::validation(format!(
                    "tagList names {tag} more than once"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn record(&self) -> Batch {
        Batch {
            batch_id: self.batch_id.clone(),
            tags: self.tags.clone(),
            chain_key: EntityKind::Batch.chain_key(&self.batch_id),
            date: self.date.clone(),
            custodian_id: self.custodian_id.clone(),
            source_chain_key: self.source_chain_key.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferItem {
    pub item_id: String,
    pub item_value: String,
    pub description: String,
    pub from: String,
    pub to: String,
    /// Transfer date; today's UTC date when empty.
    pub date: String,
}

impl TransferItem {
    pub(crate) fn validate(&self) -> LedgerResult<()> {
        require_non_empty("itemId", &self.item_id)?;
        require_non_empty("fromParty", &self.from)?;
        require_non_empty("toParty", &self.to)?;
        if self.from == self.to {
            return Err(LedgerError::validation(format!(
                "cannot transfer {} from {} to itself",
                self.item_id, self.from
            )));
        }
        Ok(())
    }
}

/// Parse a batch tag list: a JSON array of strings, or comma-separated text.
pub fn parse_tag_list(raw: &str) -> LedgerResult<Vec<String>> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str(raw)
            .map_err(|e| LedgerError::validation(format!("tagList is not a JSON string array: {e}")));
    }
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect())
}

fn require_non_empty(field: &str, value: &str) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Entity keys must be non-empty and stay clear of bookkeeping key forms.
fn require_entity_key(field: &str, value: &str) -> LedgerResult<()> {
    require_non_empty(field, value)?;
    if let Some(form) = reserved_form(value) {
        return Err(LedgerError::validation(format!(
            "{field} {value} has the form of a {form}"
        )));
    }
    Ok(())
}

fn require_finite(field: &str, value: f64) -> LedgerResult<()> {
    if !value.is_finite() {
        return Err(LedgerError::validation(format!(
            "{field} must be a finite number"
        )));
    }
    Ok(())
}
