use serde::de::DeserializeOwned;
use serde::Serialize;

use prov_store::{EntityStore, KvView};

use crate::error::ChainResult;

/// Current contents of the list under `key`; absent reads as empty.
pub(crate) fn load<T: DeserializeOwned>(
    entities: &EntityStore,
    view: &dyn KvView,
    key: &str,
) -> ChainResult<Vec<T>> {
    Ok(entities.get_json::<Vec<T>>(view, key)?.unwrap_or_default())
}

pub(crate) fn store<T: Serialize>(
    entities: &EntityStore,
    view: &mut dyn KvView,
    key: &str,
    items: &[T],
) -> ChainResult<()> {
    entities.put_json(view, key, items)?;
    Ok(())
}
