//! Vaultkeeper Store - Observable durable key-value storage
//!
//! The store holds two independent records:
//! - `vault`: the encrypted vault ciphertext (opaque string)
//! - `nicknames`: the plaintext address → display name map
//!
//! Every successful update broadcasts the new full [`PersistedState`] to
//! subscribers.
//!
//! Backends:
//! - [`MemoryStore`] - in-process, for tests and ephemeral sessions
//! - [`SledStore`] - embedded sled database

pub mod memory;
pub mod sled_store;

pub use memory::*;
pub use sled_store::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use vaultkeeper_types::{NicknameMap, Result};

/// Default capacity of the change-notification channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Everything the store persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Encrypted vault, absent until a vault is created
    pub vault: Option<String>,
    /// Plaintext nicknames, survive lock
    #[serde(default)]
    pub nicknames: NicknameMap,
}

/// Partial update: only the provided records are replaced
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub vault: Option<String>,
    pub nicknames: Option<NicknameMap>,
}

impl StateUpdate {
    /// Replace the vault ciphertext
    pub fn vault(ciphertext: impl Into<String>) -> Self {
        Self {
            vault: Some(ciphertext.into()),
            nicknames: None,
        }
    }

    /// Replace the nickname map
    pub fn nicknames(nicknames: NicknameMap) -> Self {
        Self {
            vault: None,
            nicknames: Some(nicknames),
        }
    }

    /// Apply onto a state
    pub fn apply_to(self, state: &mut PersistedState) {
        if let Some(vault) = self.vault {
            state.vault = Some(vault);
        }
        if let Some(nicknames) = self.nicknames {
            state.nicknames = nicknames;
        }
    }
}

/// Durable storage with change notification
#[async_trait]
pub trait Store: Send + Sync {
    /// Current persisted state
    async fn get(&self) -> Result<PersistedState>;

    /// Merge `update` into the persisted state and return the result
    async fn update(&self, update: StateUpdate) -> Result<PersistedState>;

    /// Receive every state produced by a successful `update`
    fn subscribe(&self) -> broadcast::Receiver<PersistedState>;
}
