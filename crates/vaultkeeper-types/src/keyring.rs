//! Keyring records and summaries shared between the controller and keyrings

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Serialized secret state of one keyring, as stored inside the vault.
///
/// `data` is opaque to everything except the keyring type that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedKeyringRecord {
    /// Registry tag of the keyring type
    #[serde(rename = "type")]
    pub keyring_type: String,
    /// Keyring-specific payload
    pub data: serde_json::Value,
}

/// The decrypted vault: every live keyring, in order
pub type VaultRecords = Vec<SerializedKeyringRecord>;

/// Public view of a live keyring (no secret material)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyringSummary {
    /// Registry tag of the keyring type
    pub keyring_type: String,
    /// Accounts held, in derivation order
    pub accounts: Vec<Address>,
}

/// Result of signing a transaction. Nothing is broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Signing account
    pub from: Address,
    /// `0x`-prefixed keccak256 of the canonical transaction payload
    pub hash: String,
    /// `0x`-prefixed 65-byte `r || s || v` signature
    pub signature: String,
    /// The payload that was signed, unchanged
    pub tx: serde_json::Value,
}
