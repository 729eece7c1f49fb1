//! Vaultkeeper Keyring - Pluggable key management
//!
//! A keyring owns secret material and the ordered list of accounts derived
//! from it. The controller never looks inside a keyring: it creates them
//! through the [`KeyringRegistry`], persists whatever [`Keyring::serialize`]
//! returns, and routes account and signing calls to them.
//!
//! Shipped keyring types:
//! - [`HdKeyring`] (`"HD Key Tree"`) - BIP-39 seed phrase, BIP-32 secp256k1 derivation
//! - [`SimpleKeyring`] (`"Simple Key Pair"`) - individually imported private keys

pub mod eth;
pub mod hd;
pub mod registry;
pub mod simple;

pub use hd::*;
pub use registry::*;
pub use simple::*;

use async_trait::async_trait;
use zeroize::Zeroizing;

use vaultkeeper_types::{Address, Result, SignedTransaction, VaultError};

/// Keyring capability implemented by every keyring type
#[async_trait]
pub trait Keyring: Send + Sync {
    /// Registry tag of this keyring type
    fn keyring_type(&self) -> &'static str;

    /// Serialize the secret state for the vault
    async fn serialize(&self) -> Result<serde_json::Value>;

    /// Restore secret state (from the vault, or from constructor options)
    async fn deserialize(&mut self, data: serde_json::Value) -> Result<()>;

    /// Accounts held, in derivation order
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Derive `count` new accounts and return them
    async fn add_accounts(&mut self, count: usize) -> Result<Vec<Address>>;

    /// Forget one account
    async fn remove_account(&mut self, address: &Address) -> Result<()> {
        Err(VaultError::keyring(format!(
            "{} keyring cannot remove account {}",
            self.keyring_type(),
            address
        )))
    }

    /// Private key of an account, hex encoded without prefix
    async fn export_account(&self, address: &Address) -> Result<Zeroizing<String>>;

    /// Sign an opaque transaction payload
    async fn sign_transaction(
        &self,
        address: &Address,
        tx: &serde_json::Value,
    ) -> Result<SignedTransaction>;

    /// Sign a free-form message (personal message prefix applied)
    async fn sign_message(&self, address: &Address, data: &[u8]) -> Result<String>;

    /// Sign structured/typed data
    async fn sign_typed_data(&self, address: &Address, data: &serde_json::Value)
        -> Result<String>;

    /// Decentralized-identity documents, one per account
    async fn identity_documents(&self) -> Result<Vec<serde_json::Value>>;
}
