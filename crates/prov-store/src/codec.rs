//! The one canonical encoder for persisted values (JSON via serde).

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// Encode a value for storage.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode a value read from `key`. Failures are reported as corruption of that key.
pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failure_names_the_key() {
        let err = decode::<Vec<String>>("animal-ids", b"{not json").unwrap_err();
        match err {
            StoreError::Corrupt { key, .. } => assert_eq!(key, "animal-ids"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn encode_then_decode_list() {
        let list = vec!["T01".to_string(), "T02".to_string()];
        let bytes = encode(&list).unwrap();
        assert_eq!(bytes, br#"["T01","T02"]"#);
        let back: Vec<String> = decode("k", &bytes).unwrap();
        assert_eq!(back, list);
    }
}
