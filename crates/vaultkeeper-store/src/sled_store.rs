//! sled-backed store
//!
//! Records are JSON values under the keys `vault` and `nicknames`. Both keys
//! are written in one atomic batch and flushed before the update returns.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use vaultkeeper_types::{NicknameMap, Result, VaultError};

use crate::{PersistedState, StateUpdate, Store, DEFAULT_CHANNEL_CAPACITY};

const VAULT_KEY: &[u8] = b"vault";
const NICKNAMES_KEY: &[u8] = b"nicknames";

/// Durable store on an embedded sled database
pub struct SledStore {
    db: sled::Db,
    events: broadcast::Sender<PersistedState>,
}

fn storage_err(e: sled::Error) -> VaultError {
    VaultError::storage(e.to_string())
}

impl SledStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(storage_err)?;
        info!(path = %path.display(), "opened sled vault store");
        Ok(Self::from_db(db))
    }

    /// Throwaway database removed on drop
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage_err)?;
        Ok(Self::from_db(db))
    }

    fn from_db(db: sled::Db) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { db, events }
    }

    fn read_state(&self) -> Result<PersistedState> {
        let vault = match self.db.get(VAULT_KEY).map_err(storage_err)? {
            Some(bytes) => Some(serde_json::from_slice::<String>(&bytes)?),
            None => None,
        };
        let nicknames = match self.db.get(NICKNAMES_KEY).map_err(storage_err)? {
            Some(bytes) => serde_json::from_slice::<NicknameMap>(&bytes)?,
            None => NicknameMap::new(),
        };
        Ok(PersistedState { vault, nicknames })
    }
}

#[async_trait]
impl Store for SledStore {
    async fn get(&self) -> Result<PersistedState> {
        self.read_state()
    }

    async fn update(&self, update: StateUpdate) -> Result<PersistedState> {
        let mut batch = sled::Batch::default();
        if let Some(vault) = &update.vault {
            batch.insert(VAULT_KEY, serde_json::to_vec(vault)?);
        }
        if let Some(nicknames) = &update.nicknames {
            batch.insert(NICKNAMES_KEY, serde_json::to_vec(nicknames)?);
        }

        self.db.apply_batch(batch).map_err(storage_err)?;
        let flushed = self.db.flush_async().await.map_err(storage_err)?;
        debug!(bytes = flushed, "flushed vault store");

        let snapshot = self.read_state()?;
        // Ignore send errors (no receivers)
        let _ = self.events.send(snapshot.clone());
        Ok(snapshot)
    }

    fn subscribe(&self) -> broadcast::Receiver<PersistedState> {
        self.events.subscribe()
    }
}
