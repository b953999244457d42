use std::path::Path;

use serde::{Deserialize, Serialize};

use prov_gate::TransferPolicy;

/// Errors loading a [`LedgerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Ledger configuration, read from TOML.
///
/// ```toml
/// transfer_policy = "sender-must-match"
/// require_upstream_record = true
/// seal_chains = true
/// channel_capacity = 64
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Who may record a custody transfer.
    pub transfer_policy: TransferPolicy,
    /// Derived entities must name an existing upstream record.
    pub require_upstream_record: bool,
    /// Seal appended chain events with a digest link.
    pub seal_chains: bool,
    /// Queue depth of the single-writer service.
    pub channel_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transfer_policy: TransferPolicy::default(),
            require_upstream_record: true,
            seal_chains: true,
            channel_capacity: 64,
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
