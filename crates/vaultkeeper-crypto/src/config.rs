//! Key-derivation parameters

use serde::{Deserialize, Serialize};

/// Argon2id parameters used to turn the vault password into an encryption key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptorConfig {
    /// Memory cost in KiB (OWASP recommends 19456 KiB = 19 MiB minimum)
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Salt length in bytes
    pub salt_length: usize,
}

impl Default for EncryptorConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
            salt_length: 16,
        }
    }
}

impl EncryptorConfig {
    /// Minimal parameters for tests. Never use for a real vault.
    pub fn insecure_fast() -> Self {
        Self {
            memory_cost: 64,
            time_cost: 1,
            parallelism: 1,
            salt_length: 16,
        }
    }
}
