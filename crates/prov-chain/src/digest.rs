use prov_types::ChainEvent;

use crate::error::{ChainError, ChainResult};

/// Domain-separated BLAKE3 digest over header chain events.
///
/// Each digest covers the previous digest, the sequence number, and the
/// canonical JSON of the event, so editing or reordering any stored event
/// changes every digest after it.
pub struct EventDigest {
    domain: &'static str,
}

impl EventDigest {
    /// Digest used for header chain events.
    pub const CHAIN: Self = Self {
        domain: "prov-chain-event-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hex digest of `event` at position `seq`, linked to `prev`.
    pub fn compute(
        &self,
        prev: Option<&str>,
        seq: u64,
        event: &ChainEvent,
    ) -> ChainResult<String> {
        let payload =
            serde_json::to_vec(event).map_err(|e| ChainError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        if let Some(prev) = prev {
            hasher.update(prev.as_bytes());
        }
        hasher.update(b":");
        hasher.update(&seq.to_le_bytes());
        hasher.update(&payload);
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prov_types::EventType;

    fn event(value: &str) -> ChainEvent {
        ChainEvent::new("b1", EventType::Create, value, "")
    }

    #[test]
    fn digest_is_deterministic() {
        let a = EventDigest::CHAIN.compute(None, 1, &event("T01")).unwrap();
        let b = EventDigest::CHAIN.compute(None, 1, &event("T01")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn digest_depends_on_prev_seq_and_event() {
        let base = EventDigest::CHAIN.compute(None, 1, &event("T01")).unwrap();
        assert_ne!(
            base,
            EventDigest::CHAIN.compute(Some("00"), 1, &event("T01")).unwrap()
        );
        assert_ne!(
            base,
            EventDigest::CHAIN.compute(None, 2, &event("T01")).unwrap()
        );
        assert_ne!(
            base,
            EventDigest::CHAIN.compute(None, 1, &event("T02")).unwrap()
        );
    }

    #[test]
    fn custom_domain_differs() {
        let custom = EventDigest::new("other-v1");
        assert_ne!(
            custom.compute(None, 1, &event("x")).unwrap(),
            EventDigest::CHAIN.compute(None, 1, &event("x")).unwrap()
        );
        assert_eq!(custom.domain(), "other-v1");
    }
}
