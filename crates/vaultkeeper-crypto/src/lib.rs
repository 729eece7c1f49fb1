//! Vaultkeeper Crypto - Vault encryption capability
//!
//! This crate provides:
//! - The [`Encryptor`] capability: payload + password → opaque ciphertext, and back
//! - [`PasswordEncryptor`]: Argon2id key derivation with ChaCha20-Poly1305 AEAD
//!
//! # Security Invariant
//!
//! **Decrypted keyring material never reaches storage.** The controller only
//! ever hands the store what an `Encryptor` produced, and never inspects it.

pub mod config;
pub mod password;

pub use config::*;
pub use password::*;

use async_trait::async_trait;
use vaultkeeper_types::Result;

/// Turns a serializable payload plus password into an opaque ciphertext string
#[async_trait]
pub trait Encryptor: Send + Sync {
    /// Encrypt `payload` under `password`
    async fn encrypt(&self, password: &str, payload: &serde_json::Value) -> Result<String>;

    /// Decrypt a ciphertext produced by [`Encryptor::encrypt`].
    ///
    /// Fails with `VaultError::Authentication` on a wrong password or a
    /// corrupted ciphertext.
    async fn decrypt(&self, password: &str, ciphertext: &str) -> Result<serde_json::Value>;
}
