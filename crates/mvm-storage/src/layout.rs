use serde::{Deserialize, Serialize};

/// Namespace names and sentinel keys inside the shared versioned store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLayout {
    /// Write-set values (`address ‖ ":" ‖ path -> bytes`)
    pub write_sets: String,
    /// Chain-wide flags
    pub singleton: String,
    /// Committed transaction states (`tx id -> TxState`)
    pub txs: String,
    /// Verified blocks (`block id -> bytes`)
    pub blocks: String,
    /// Key of the "genesis applied" flag in the singleton namespace
    pub initialized_key: String,
    /// Key of the last accepted block id in the blocks namespace
    pub last_accepted_key: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            write_sets: "writeSets".to_string(),
            singleton: "singleton".to_string(),
            txs: "txs".to_string(),
            blocks: "blocks".to_string(),
            initialized_key: "initialized".to_string(),
            last_accepted_key: "lastAccepted".to_string(),
        }
    }
}
