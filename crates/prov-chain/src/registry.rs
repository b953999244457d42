use tracing::{debug, Span};

use prov_store::{EntityStore, KvView};

use crate::error::{ChainError, ChainResult};
use crate::list;

/// Ordered, duplicate-free membership lists under well-known keys.
///
/// A member, once added, is never removed or moved. Appending a member that
/// is already present is a no-op.
#[derive(Clone, Debug)]
pub struct Registry {
    entities: EntityStore,
    span: Span,
}

impl Registry {
    pub fn new(span: Span) -> Self {
        Self {
            entities: EntityStore::new(span.clone()),
            span,
        }
    }

    /// Append `member` to `collection`. Returns `true` if it was newly added.
    pub fn append(
        &self,
        view: &mut dyn KvView,
        collection: &str,
        member: &str,
    ) -> ChainResult<bool> {
        if member.is_empty() {
            return Err(ChainError::EmptyMember(collection.to_string()));
        }
        let mut members: Vec<String> = list::load(&self.entities, view, collection)?;
        if members.iter().any(|m| m == member) {
            return Ok(false);
        }
        members.push(member.to_string());
        list::store(&self.entities, view, collection, &members)?;
        debug!(parent: &self.span, collection, member, size = members.len(), "registry append");
        Ok(true)
    }

    /// Members of `collection` in the order they were added.
    pub fn list_all(&self, view: &dyn KvView, collection: &str) -> ChainResult<Vec<String>> {
        list::load(&self.entities, view, collection)
    }

    /// Write an empty list under `collection` if nothing is stored there yet.
    /// Returns `true` if the list was written.
    pub fn initialize(&self, view: &mut dyn KvView, collection: &str) -> ChainResult<bool> {
        if self
            .entities
            .get_json::<Vec<String>>(view, collection)?
            .is_some()
        {
            return Ok(false);
        }
        list::store::<String>(&self.entities, view, collection, &[])?;
        debug!(parent: &self.span, collection, "registry initialized");
        Ok(true)
    }
}
