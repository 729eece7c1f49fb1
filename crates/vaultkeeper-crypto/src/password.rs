//! Password Encryptor
//!
//! Vault encryption keyed by a user password:
//! - Argon2id derives a 256-bit key from the password and a fresh random salt
//! - ChaCha20-Poly1305 encrypts the JSON payload under a fresh 96-bit nonce
//! - The ciphertext string is a JSON envelope `{"data","iv","salt","kdf"}`
//!   with base64 fields and the Argon2 costs, so the whole vault fits in one
//!   store value and stays readable after the configured costs change
//!
//! Key derivation is CPU- and memory-bound, so both directions run on
//! tokio's blocking pool.

use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use vaultkeeper_types::{Result, VaultError};

use crate::config::EncryptorConfig;
use crate::Encryptor;

/// AEAD nonce length in bytes
const NONCE_LEN: usize = 12;

/// Argon2id costs a vault was sealed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct KdfParams {
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
}

impl From<&EncryptorConfig> for KdfParams {
    fn from(config: &EncryptorConfig) -> Self {
        Self {
            m_cost: config.memory_cost,
            t_cost: config.time_cost,
            p_cost: config.parallelism,
        }
    }
}

/// Serialized form of an encrypted vault
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// Ciphertext with the Poly1305 tag appended
    data: String,
    /// Nonce
    iv: String,
    /// Argon2 salt
    salt: String,
    kdf: KdfParams,
}

/// Argon2id + ChaCha20-Poly1305 encryptor
///
/// The configuration only governs new encryptions. Decryption uses the
/// costs recorded in the envelope.
#[derive(Debug, Clone, Default)]
pub struct PasswordEncryptor {
    config: EncryptorConfig,
}

impl PasswordEncryptor {
    /// Create a new encryptor
    pub fn new(config: EncryptorConfig) -> Self {
        Self { config }
    }

    /// Derive the 32-byte vault key
    fn derive_key(kdf: &KdfParams, password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        let params = Params::new(kdf.m_cost, kdf.t_cost, kdf.p_cost, Some(32)).map_err(|e| {
            VaultError::Encryption {
                reason: format!("invalid Argon2 params: {}", e),
            }
        })?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(password, salt, &mut key[..])
            .map_err(|e| VaultError::Encryption {
                reason: format!("key derivation failed: {}", e),
            })?;

        Ok(key)
    }

    fn seal(config: &EncryptorConfig, password: &[u8], plaintext: &[u8]) -> Result<String> {
        let mut salt = vec![0u8; config.salt_length];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let kdf = KdfParams::from(config);
        let key = Self::derive_key(&kdf, password, &salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        let data = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| VaultError::Encryption {
                reason: format!("AEAD encryption failed: {}", e),
            })?;

        let envelope = Envelope {
            data: BASE64.encode(data),
            iv: BASE64.encode(nonce),
            salt: BASE64.encode(salt),
            kdf,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    fn open(password: &[u8], ciphertext: &str) -> Result<Zeroizing<Vec<u8>>> {
        // Any malformed envelope is indistinguishable from tampering
        let envelope: Envelope =
            serde_json::from_str(ciphertext).map_err(|_| VaultError::Authentication)?;
        let data = BASE64
            .decode(&envelope.data)
            .map_err(|_| VaultError::Authentication)?;
        let nonce = BASE64
            .decode(&envelope.iv)
            .map_err(|_| VaultError::Authentication)?;
        let salt = BASE64
            .decode(&envelope.salt)
            .map_err(|_| VaultError::Authentication)?;

        if nonce.len() != NONCE_LEN {
            return Err(VaultError::Authentication);
        }

        let key = Self::derive_key(&envelope.kdf, password, &salt)
            .map_err(|_| VaultError::Authentication)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), data.as_slice())
            .map_err(|_| VaultError::Authentication)?;

        Ok(Zeroizing::new(plaintext))
    }
}

#[async_trait]
impl Encryptor for PasswordEncryptor {
    async fn encrypt(&self, password: &str, payload: &serde_json::Value) -> Result<String> {
        let config = self.config.clone();
        let password = Zeroizing::new(password.as_bytes().to_vec());
        let plaintext = Zeroizing::new(serde_json::to_vec(payload)?);
        debug!(bytes = plaintext.len(), memory_kib = config.memory_cost, "encrypting vault");

        tokio::task::spawn_blocking(move || Self::seal(&config, &password, &plaintext))
            .await
            .map_err(|e| VaultError::Encryption {
                reason: format!("encryption task failed: {}", e),
            })?
    }

    async fn decrypt(&self, password: &str, ciphertext: &str) -> Result<serde_json::Value> {
        let password = Zeroizing::new(password.as_bytes().to_vec());
        let ciphertext = ciphertext.to_string();

        let plaintext =
            tokio::task::spawn_blocking(move || Self::open(&password, &ciphertext))
                .await
                .map_err(|e| VaultError::Encryption {
                    reason: format!("decryption task failed: {}", e),
                })??;

        serde_json::from_slice(&plaintext).map_err(|_| VaultError::Authentication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encryptor() -> PasswordEncryptor {
        PasswordEncryptor::new(EncryptorConfig::insecure_fast())
    }

    #[tokio::test]
    async fn test_encrypt_decrypt_roundtrip() {
        let enc = encryptor();
        let payload = json!([{ "type": "HD Key Tree", "data": { "numberOfAccounts": 1 } }]);

        let ciphertext = enc.encrypt("pw1", &payload).await.unwrap();
        assert!(!ciphertext.contains("HD Key Tree"));

        let back = enc.decrypt("pw1", &ciphertext).await.unwrap();
        assert_eq!(back, payload);
    }

    #[tokio::test]
    async fn test_wrong_password_fails_authentication() {
        let enc = encryptor();
        let ciphertext = enc.encrypt("pw1", &json!({"a": 1})).await.unwrap();

        let err = enc.decrypt("pw2", &ciphertext).await.unwrap_err();
        assert!(matches!(err, VaultError::Authentication));
    }

    #[tokio::test]
    async fn test_corrupted_ciphertext_fails_authentication() {
        let enc = encryptor();
        let ciphertext = enc.encrypt("pw1", &json!("secret")).await.unwrap();

        let mut envelope: serde_json::Value = serde_json::from_str(&ciphertext).unwrap();
        envelope["data"] = json!(BASE64.encode(b"not the real ciphertext bytes"));
        let tampered = envelope.to_string();

        let err = enc.decrypt("pw1", &tampered).await.unwrap_err();
        assert!(matches!(err, VaultError::Authentication));

        let err = enc.decrypt("pw1", "garbage").await.unwrap_err();
        assert!(matches!(err, VaultError::Authentication));
    }

    #[tokio::test]
    async fn test_fresh_salt_and_nonce_per_encryption() {
        let enc = encryptor();
        let payload = json!({"same": "payload"});
        let a = enc.encrypt("pw1", &payload).await.unwrap();
        let b = enc.encrypt("pw1", &payload).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_decrypt_uses_recorded_costs() {
        let payload = json!({"keyrings": 1});
        let ciphertext = encryptor().encrypt("pw1", &payload).await.unwrap();

        let envelope: serde_json::Value = serde_json::from_str(&ciphertext).unwrap();
        assert_eq!(envelope["kdf"]["m_cost"], 64);
        assert_eq!(envelope["kdf"]["t_cost"], 1);

        let retuned = PasswordEncryptor::new(EncryptorConfig {
            memory_cost: 128,
            time_cost: 2,
            ..EncryptorConfig::insecure_fast()
        });
        assert_eq!(retuned.decrypt("pw1", &ciphertext).await.unwrap(), payload);

        let err = retuned.decrypt("pw2", &ciphertext).await.unwrap_err();
        assert!(matches!(err, VaultError::Authentication));
    }
}
