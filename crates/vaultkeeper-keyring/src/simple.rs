//! Simple key pair keyring: a flat list of imported (non-derived) private keys.
//!
//! Serialized form is a JSON array of hex private keys.

use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use vaultkeeper_types::{Address, Result, SignedTransaction, VaultError};

use crate::eth;
use crate::Keyring;

/// Registry tag of the simple key pair keyring
pub const SIMPLE_KEYRING_TYPE: &str = "Simple Key Pair";

/// Keyring of independently imported key pairs
#[derive(Default)]
pub struct SimpleKeyring {
    wallets: Vec<SigningKey>,
}

impl SimpleKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry factory
    pub fn factory() -> Box<dyn Keyring> {
        Box::new(Self::new())
    }
}

#[async_trait]
impl Keyring for SimpleKeyring {
    fn keyring_type(&self) -> &'static str {
        SIMPLE_KEYRING_TYPE
    }

    async fn serialize(&self) -> Result<serde_json::Value> {
        let keys: Vec<String> = self
            .wallets
            .iter()
            .map(|k| eth::signing_key_to_hex(k).to_string())
            .collect();
        Ok(serde_json::Value::from(keys))
    }

    async fn deserialize(&mut self, data: serde_json::Value) -> Result<()> {
        if data.is_null() {
            self.wallets.clear();
            return Ok(());
        }

        let keys: Vec<Zeroizing<String>> = serde_json::from_value::<Vec<String>>(data)?
            .into_iter()
            .map(Zeroizing::new)
            .collect();
        // Parse every key before replacing any
        let wallets = keys
            .iter()
            .map(|k| eth::signing_key_from_hex(k))
            .collect::<Result<Vec<_>>>()?;
        self.wallets = wallets;
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.wallets.iter().map(eth::address_of).collect())
    }

    async fn add_accounts(&mut self, count: usize) -> Result<Vec<Address>> {
        let mut added = Vec::with_capacity(count);
        for _ in 0..count {
            let key = SigningKey::random(&mut OsRng);
            added.push(eth::address_of(&key));
            self.wallets.push(key);
        }
        Ok(added)
    }

    async fn remove_account(&mut self, address: &Address) -> Result<()> {
        let before = self.wallets.len();
        self.wallets.retain(|k| &eth::address_of(k) != address);
        if self.wallets.len() == before {
            return Err(VaultError::not_found("account", address.to_prefixed()));
        }
        Ok(())
    }

    async fn export_account(&self, address: &Address) -> Result<Zeroizing<String>> {
        let key = eth::find_key(&self.wallets, address)?;
        Ok(eth::signing_key_to_hex(key))
    }

    async fn sign_transaction(
        &self,
        address: &Address,
        tx: &serde_json::Value,
    ) -> Result<SignedTransaction> {
        eth::sign_transaction(eth::find_key(&self.wallets, address)?, tx)
    }

    async fn sign_message(&self, address: &Address, data: &[u8]) -> Result<String> {
        let key = eth::find_key(&self.wallets, address)?;
        eth::sign_prehash(key, &eth::personal_message_hash(data))
    }

    async fn sign_typed_data(
        &self,
        address: &Address,
        data: &serde_json::Value,
    ) -> Result<String> {
        let key = eth::find_key(&self.wallets, address)?;
        eth::sign_prehash(key, &eth::typed_data_hash(data)?)
    }

    async fn identity_documents(&self) -> Result<Vec<serde_json::Value>> {
        Ok(self
            .wallets
            .iter()
            .map(|k| eth::did_document(&eth::address_of(k)))
            .collect())
    }
}
