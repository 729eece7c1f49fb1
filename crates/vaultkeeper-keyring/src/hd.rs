//! HD keyring: accounts derived from a BIP-39 seed phrase.
//!
//! Accounts are derived along `{hd_path}/{index}` (BIP-32, secp256k1) with the
//! default Ethereum path `m/44'/60'/0'/0`. The serialized form carries the
//! mnemonic, the path, and the number of derived accounts, so deserializing
//! re-derives exactly the same account list.

use async_trait::async_trait;
use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use vaultkeeper_types::{Address, Result, SignedTransaction, VaultError};

use crate::eth;
use crate::Keyring;

/// Registry tag of the HD keyring
pub const HD_KEYRING_TYPE: &str = "HD Key Tree";

/// Default BIP-44 Ethereum derivation path (account index appended)
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0";

/// Word count of freshly generated seed phrases
pub const NEW_PHRASE_WORDS: usize = 12;

/// Serialized HD keyring state
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HdKeyringData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mnemonic: Option<String>,
    #[serde(default)]
    number_of_accounts: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hd_path: Option<String>,
}

/// BIP-39/BIP-32 hierarchical deterministic keyring
pub struct HdKeyring {
    mnemonic: Option<Zeroizing<String>>,
    seed: Option<Zeroizing<[u8; 64]>>,
    hd_path: String,
    wallets: Vec<SigningKey>,
}

impl Default for HdKeyring {
    fn default() -> Self {
        Self {
            mnemonic: None,
            seed: None,
            hd_path: DEFAULT_HD_PATH.to_string(),
            wallets: Vec::new(),
        }
    }
}

impl HdKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry factory
    pub fn factory() -> Box<dyn Keyring> {
        Box::new(Self::new())
    }

    /// Normalize whitespace and case, then check words and checksum
    ///
    /// Accepts any BIP-39 length from 12 to 24 words.
    pub fn validate_mnemonic(phrase: &str) -> Result<Mnemonic> {
        let normalized = Zeroizing::new(
            phrase
                .split_whitespace()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join(" "),
        );
        Mnemonic::parse_in_normalized(Language::English, normalized.as_str())
            .map_err(|_| VaultError::validation("seed phrase", "invalid words or checksum"))
    }

    fn init_from_mnemonic(&mut self, mnemonic: &Mnemonic) {
        self.seed = Some(Zeroizing::new(mnemonic.to_seed("")));
        self.mnemonic = Some(Zeroizing::new(mnemonic.to_string()));
        self.wallets.clear();
    }

    fn derive(&self, index: usize) -> Result<SigningKey> {
        let seed = self
            .seed
            .as_ref()
            .ok_or_else(|| VaultError::keyring("HD keyring has no seed"))?;
        let path: DerivationPath = format!("{}/{}", self.hd_path, index)
            .parse()
            .map_err(|e| VaultError::keyring(format!("invalid derivation path: {}", e)))?;
        let xprv = XPrv::derive_from_path(&seed[..], &path)
            .map_err(|e| VaultError::keyring(format!("derivation failed: {}", e)))?;
        Ok(xprv.private_key().clone())
    }
}

#[async_trait]
impl Keyring for HdKeyring {
    fn keyring_type(&self) -> &'static str {
        HD_KEYRING_TYPE
    }

    async fn serialize(&self) -> Result<serde_json::Value> {
        let data = HdKeyringData {
            mnemonic: self.mnemonic.as_ref().map(|m| m.to_string()),
            number_of_accounts: self.wallets.len(),
            hd_path: Some(self.hd_path.clone()),
        };
        Ok(serde_json::to_value(data)?)
    }

    async fn deserialize(&mut self, data: serde_json::Value) -> Result<()> {
        let data: HdKeyringData = if data.is_null() {
            HdKeyringData::default()
        } else {
            serde_json::from_value(data)?
        };

        if let Some(path) = data.hd_path {
            self.hd_path = path;
        }
        if let Some(phrase) = data.mnemonic.map(Zeroizing::new) {
            let mnemonic = Self::validate_mnemonic(&phrase)?;
            self.init_from_mnemonic(&mnemonic);
        }
        if data.number_of_accounts > 0 {
            self.add_accounts(data.number_of_accounts).await?;
        }
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.wallets.iter().map(eth::address_of).collect())
    }

    async fn add_accounts(&mut self, count: usize) -> Result<Vec<Address>> {
        if self.seed.is_none() {
            let mnemonic = Mnemonic::generate_in_with(&mut OsRng, Language::English, NEW_PHRASE_WORDS)
                .map_err(|e| VaultError::keyring(format!("seed phrase generation failed: {}", e)))?;
            self.init_from_mnemonic(&mnemonic);
            debug!("generated new seed phrase");
        }

        let start = self.wallets.len();
        let mut added = Vec::with_capacity(count);
        for index in start..start + count {
            let key = self.derive(index)?;
            added.push(eth::address_of(&key));
            self.wallets.push(key);
        }
        debug!(count, hd_path = %self.hd_path, total = self.wallets.len(), "derived HD accounts");
        Ok(added)
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[tokio::test]
    async fn test_known_first_account() {
        let mut keyring = HdKeyring::new();
        keyring
            .deserialize(json!({ "mnemonic": TEST_MNEMONIC, "numberOfAccounts": 1 }))
            .await
            .unwrap();

        let accounts = keyring.accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(
            accounts[0].as_str(),
            "9858effd232b4033e47d90003d41ec34ecaeda94"
        );

        let exported = keyring.export_account(&accounts[0]).await.unwrap();
        assert_eq!(
            exported.as_str(),
            "1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
        );
    }

    #[tokio::test]
    async fn test_serialize_restores_same_accounts() {
        let mut keyring = HdKeyring::new();
        keyring.add_accounts(3).await.unwrap();
        let data = keyring.serialize().await.unwrap();
        assert_eq!(data["numberOfAccounts"], 3);

        let mut restored = HdKeyring::new();
        restored.deserialize(data).await.unwrap();
        assert_eq!(
            restored.accounts().await.unwrap(),
            keyring.accounts().await.unwrap()
        );
    }

    #[test]
    fn test_validate_mnemonic_checksum() {
        assert!(HdKeyring::validate_mnemonic(TEST_MNEMONIC).is_ok());
        assert!(HdKeyring::validate_mnemonic(&format!("  {}  ", TEST_MNEMONIC.to_uppercase())).is_ok());

        // Valid words, wrong checksum word
        let bad = TEST_MNEMONIC.replace("about", "abandon");
        let err = HdKeyring::validate_mnemonic(&bad).unwrap_err();
        assert!(matches!(err, VaultError::Validation { .. }));
    }

    #[test]
    fn test_validate_mnemonic_lengths() {
        let twelve = HdKeyring::validate_mnemonic(TEST_MNEMONIC).unwrap();
        assert_eq!(twelve.word_count(), 12);

        let twenty_four = format!("{} art", "abandon ".repeat(23).trim_end());
        assert_eq!(HdKeyring::validate_mnemonic(&twenty_four).unwrap().word_count(), 24);

        let eleven = TEST_MNEMONIC.replacen("abandon ", "", 1);
        assert!(HdKeyring::validate_mnemonic(&eleven).is_err());
        assert!(HdKeyring::validate_mnemonic("abandon abandon notaword").is_err());
    }

    #[tokio::test]
    async fn test_generated_phrase_is_twelve_words() {
        let mut keyring = HdKeyring::new();
        keyring.add_accounts(1).await.unwrap();

        let data = keyring.serialize().await.unwrap();
        let phrase = data["mnemonic"].as_str().unwrap();
        assert_eq!(phrase.split_whitespace().count(), NEW_PHRASE_WORDS);
        assert!(HdKeyring::validate_mnemonic(phrase).is_ok());
    }

    #[tokio::test]
    async fn test_sign_unknown_account_not_found() {
        let mut keyring = HdKeyring::new();
        keyring.add_accounts(1).await.unwrap();
        let stranger = Address::parse("2c7536e3605d9c16a7a3d7b1898e529396a65c23").unwrap();

        let err = keyring.sign_message(&stranger, b"hi").await.unwrap_err();
        assert!(matches!(err, VaultError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_removal_unsupported() {
        let mut keyring = HdKeyring::new();
        let added = keyring.add_accounts(1).await.unwrap();
        assert!(keyring.remove_account(&added[0]).await.is_err());
    }
}
