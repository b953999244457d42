use std::fmt;

use serde::{Deserialize, Serialize};

/// Who may record a transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferPolicy {
    /// The actor's name must equal the sending party.
    #[default]
    SenderMustMatch,
    /// Any authenticated actor may record any transfer.
    Open,
}

impl fmt::Display for TransferPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SenderMustMatch => f.write_str("sender-must-match"),
            Self::Open => f.write_str("open"),
        }
    }
}
