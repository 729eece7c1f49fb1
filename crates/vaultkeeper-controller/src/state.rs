//! Volatile state and controller notifications
//!
//! Nothing here is persisted. The volatile state is rebuilt on unlock and
//! after every mutation, and cleared on lock.

use serde::{Deserialize, Serialize};

use vaultkeeper_types::{Address, IdentityMap, KeyringSummary};

/// Coarse lifecycle state of the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultStatus {
    /// No vault has ever been created
    Uninitialized,
    /// Vault exists, nothing decrypted
    Locked,
    /// Password and keyrings held in memory
    Unlocked,
}

/// In-memory projection of the unlocked session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatileState {
    pub is_unlocked: bool,
    pub identities: IdentityMap,
    pub keyrings: Vec<KeyringSummary>,
}

impl VolatileState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Full state delivered to subscribers on every mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub is_unlocked: bool,
    pub supported_keyring_types: Vec<String>,
    pub keyrings: Vec<KeyringSummary>,
    pub identities: IdentityMap,
}

impl VaultSnapshot {
    /// Every account across all keyrings, in keyring order
    pub fn accounts(&self) -> Vec<Address> {
        self.keyrings
            .iter()
            .flat_map(|k| k.accounts.iter().cloned())
            .collect()
    }
}

/// Events emitted by the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerEvent {
    /// Full state after a mutation
    Update(VaultSnapshot),
    /// An account was added
    NewAccount { address: Address },
    /// A vault was created or restored
    NewVault { name: String, address: Address },
}

impl ControllerEvent {
    /// Get a short description for logging
    pub fn summary(&self) -> String {
        match self {
            ControllerEvent::Update(snapshot) => format!(
                "Update: unlocked={} keyrings={} identities={}",
                snapshot.is_unlocked,
                snapshot.keyrings.len(),
                snapshot.identities.len()
            ),
            ControllerEvent::NewAccount { address } => {
                format!("New account: {}", address.to_prefixed())
            }
            ControllerEvent::NewVault { name, address } => {
                format!("New vault {}: {}", name, address.to_prefixed())
            }
        }
    }
}
