//! In-memory store

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use vaultkeeper_types::Result;

use crate::{PersistedState, StateUpdate, Store, DEFAULT_CHANNEL_CAPACITY};

/// Store that lives only as long as the process
pub struct MemoryStore {
    state: RwLock<PersistedState>,
    events: broadcast::Sender<PersistedState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_state(PersistedState::default())
    }

    /// Start from an existing state (e.g. a vault exported elsewhere)
    pub fn with_state(state: PersistedState) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(state),
            events,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self) -> Result<PersistedState> {
        Ok(self.state.read().await.clone())
    }

    async fn update(&self, update: StateUpdate) -> Result<PersistedState> {
        let snapshot = {
            let mut state = self.state.write().await;
            update.apply_to(&mut state);
            state.clone()
        };
        // Ignore send errors (no receivers)
        let _ = self.events.send(snapshot.clone());
        Ok(snapshot)
    }

    fn subscribe(&self) -> broadcast::Receiver<PersistedState> {
        self.events.subscribe()
    }
}
