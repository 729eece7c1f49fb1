//! Controller configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use vaultkeeper_crypto::EncryptorConfig;

/// Default capacity of the controller event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// sled database directory; `None` keeps the vault in memory
    pub store_path: Option<PathBuf>,
    /// Password key-derivation parameters
    pub encryptor: EncryptorConfig,
    /// Buffered events per subscriber before the slowest one lags
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            encryptor: EncryptorConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ControllerConfig {
    /// Create config from environment variables (and a `.env` file if present)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let defaults = EncryptorConfig::default();
        Self {
            store_path: std::env::var("VAULTKEEPER_STORE_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            encryptor: EncryptorConfig {
                memory_cost: env_or("VAULTKEEPER_KDF_MEMORY_KIB", defaults.memory_cost),
                time_cost: env_or("VAULTKEEPER_KDF_ITERATIONS", defaults.time_cost),
                parallelism: env_or("VAULTKEEPER_KDF_PARALLELISM", defaults.parallelism),
                salt_length: defaults.salt_length,
            },
            event_capacity: env_or("VAULTKEEPER_EVENT_CAPACITY", DEFAULT_EVENT_CAPACITY).max(1),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
