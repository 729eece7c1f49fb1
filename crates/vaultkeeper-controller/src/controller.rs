//! Keyring controller
//!
//! Owns the vault lifecycle:
//!
//! ```text
//! Uninitialized --create/restore--> Unlocked <--unlock-- Locked
//!                                      |                   ^
//!                                      +-------lock--------+
//! ```
//!
//! Every keyring mutation re-serializes and re-encrypts all live keyrings and
//! writes the ciphertext, together with any changed names, in one store update
//! before the `Update` event goes out. Mutations
//! take `&mut self`, so callers serialize them; reads and signing take `&self`.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use vaultkeeper_crypto::{Encryptor, PasswordEncryptor};
use vaultkeeper_keyring::{
    HdKeyring, Keyring, KeyringRegistry, HD_KEYRING_TYPE, SIMPLE_KEYRING_TYPE,
};
use vaultkeeper_store::{MemoryStore, SledStore, StateUpdate, Store};
use vaultkeeper_types::{
    Address, Identity, IdentityMap, KeyringSummary, NicknameMap, Result,
    SerializedKeyringRecord, SignedTransaction, VaultError, VaultRecords,
};

use crate::config::{ControllerConfig, DEFAULT_EVENT_CAPACITY};
use crate::identity::resolve_account_name;
use crate::session::Session;
use crate::state::{ControllerEvent, VaultSnapshot, VaultStatus, VolatileState};

/// Orchestrates keyrings, the encrypted vault and account identities
pub struct KeyringController {
    registry: KeyringRegistry,
    encryptor: Arc<dyn Encryptor>,
    store: Arc<dyn Store>,
    session: Session,
    memstore: VolatileState,
    events: broadcast::Sender<ControllerEvent>,
}

impl KeyringController {
    pub fn new(
        registry: KeyringRegistry,
        encryptor: Arc<dyn Encryptor>,
        store: Arc<dyn Store>,
    ) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            registry,
            encryptor,
            store,
            session: Session::default(),
            memstore: VolatileState::default(),
            events,
        }
    }

    /// Resize the event channel. Existing subscribers are disconnected.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        self.events = events;
        self
    }

    /// Build a controller with the default keyring types from configuration
    pub fn from_config(config: &ControllerConfig) -> Result<Self> {
        let store: Arc<dyn Store> = match &config.store_path {
            Some(path) => Arc::new(SledStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        let encryptor = Arc::new(PasswordEncryptor::new(config.encryptor.clone()));

        Ok(Self::new(KeyringRegistry::default(), encryptor, store)
            .with_event_capacity(config.event_capacity))
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn is_unlocked(&self) -> bool {
        self.session.is_unlocked()
    }

    pub async fn status(&self) -> Result<VaultStatus> {
        if self.session.is_unlocked() {
            return Ok(VaultStatus::Unlocked);
        }
        match self.store.get().await?.vault {
            Some(_) => Ok(VaultStatus::Locked),
            None => Ok(VaultStatus::Uninitialized),
        }
    }

    /// Volatile state as of the last update
    pub fn state(&self) -> &VolatileState {
        &self.memstore
    }

    /// Volatile state plus the supported keyring types
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            is_unlocked: self.memstore.is_unlocked,
            supported_keyring_types: self.registry.supported_types(),
            keyrings: self.memstore.keyrings.clone(),
            identities: self.memstore.identities.clone(),
        }
    }

    // =========================================================================
    // Vault lifecycle
    // =========================================================================

    /// Create a new vault with a fresh random seed phrase and one account
    pub async fn create_new_vault_and_keychain(
        &mut self,
        name: &str,
        password: &str,
    ) -> Result<VaultSnapshot> {
        validate_password(password)?;

        let mut keyring = self.registry.create(HD_KEYRING_TYPE)?;
        let accounts = keyring.add_accounts(1).await?;
        let first = first_account(&accounts)?;

        self.install_vault(password, vec![keyring], &accounts).await?;
        info!(vault = name, address = %first, "created new vault");

        self.emit(ControllerEvent::NewVault {
            name: name.to_string(),
            address: first,
        });
        self.full_update().await
    }

    /// Replace the vault with one restored from a seed phrase
    ///
    /// The seed is validated before anything is touched; an invalid phrase
    /// leaves the prior vault in place.
    pub async fn create_new_vault_and_restore(
        &mut self,
        name: &str,
        password: &str,
        seed: &str,
    ) -> Result<VaultSnapshot> {
        validate_password(password)?;
        let mnemonic = HdKeyring::validate_mnemonic(seed).map_err(|e| {
            warn!(vault = name, "rejected restore: invalid seed phrase");
            e
        })?;

        let mut keyring = self.registry.create(HD_KEYRING_TYPE)?;
        let opts = serde_json::json!({
            "mnemonic": mnemonic.to_string(),
            "numberOfAccounts": 1,
        });
        keyring.deserialize(opts).await?;
        let accounts = keyring.accounts().await?;
        let first = first_account(&accounts)?;

        self.install_vault(password, vec![keyring], &accounts).await?;
        info!(vault = name, address = %first, "restored vault from seed phrase");

        self.emit(ControllerEvent::NewVault {
            name: name.to_string(),
            address: first,
        });
        self.full_update().await
    }

    /// Drop the password and every keyring from memory
    pub fn lock(&mut self) -> VaultSnapshot {
        self.session = Session::default();
        self.memstore.clear();
        info!("vault locked");

        let snapshot = self.snapshot();
        self.emit(ControllerEvent::Update(snapshot.clone()));
        snapshot
    }

    /// Decrypt the stored vault and rebuild keyrings and identities
    pub async fn unlock(&mut self, password: &str) -> Result<VaultSnapshot> {
        let persisted = self.store.get().await?;
        let ciphertext = persisted
            .vault
            .ok_or_else(|| VaultError::not_found("vault", "encrypted vault"))?;

        let payload = self.encryptor.decrypt(password, &ciphertext).await.map_err(|e| {
            warn!("unlock rejected");
            e
        })?;
        let records: VaultRecords = serde_json::from_value(payload)?;

        let mut keyrings = Vec::with_capacity(records.len());
        for record in records {
            keyrings.push(self.restore_keyring(record).await?);
        }

        let accounts = collect_accounts(&keyrings).await?;
        let mut nicknames = persisted.nicknames;
        let (identities, newly_named) = build_identities(&accounts, &mut nicknames);
        if newly_named > 0 {
            debug!(newly_named, "persisting default names for unnamed accounts");
            self.store.update(StateUpdate::nicknames(nicknames)).await?;
        }

        self.session = Session::unlocked(password, keyrings);
        self.memstore.identities = identities;
        info!(keyrings = self.session.keyrings().len(), "vault unlocked");
        self.full_update().await
    }

    /// Check a password against the stored vault without unlocking
    pub async fn verify_password(&self, password: &str) -> Result<()> {
        let ciphertext = self
            .store
            .get()
            .await?
            .vault
            .ok_or_else(|| VaultError::not_found("vault", "encrypted vault"))?;
        self.encryptor.decrypt(password, &ciphertext).await?;
        Ok(())
    }

    // =========================================================================
    // Keyrings and accounts
    // =========================================================================

    /// Construct a keyring of a registered type and add it to the vault
    ///
    /// Returns the new keyring's index.
    pub async fn add_new_keyring(
        &mut self,
        keyring_type: &str,
        opts: serde_json::Value,
    ) -> Result<usize> {
        self.ensure_unlocked()?;

        let mut keyring = self.registry.create(keyring_type)?;
        keyring.deserialize(opts).await?;
        let mut accounts = keyring.accounts().await?;
        if accounts.is_empty() {
            accounts = keyring.add_accounts(1).await?;
        }
        self.check_for_duplicate(keyring_type, &accounts).await?;

        let mut records = serialize_keyrings(self.session.keyrings()).await?;
        records.push(SerializedKeyringRecord {
            keyring_type: keyring.keyring_type().to_string(),
            data: keyring.serialize().await?,
        });
        let (nicknames, identities) = self
            .name_accounts(&accounts, None, &self.memstore.identities)
            .await?;
        self.persist_records(records, Some(nicknames)).await?;

        self.session.keyrings_mut().push(keyring);
        self.memstore.identities = identities;
        let index = self.session.keyrings().len() - 1;
        info!(keyring_type, index, accounts = accounts.len(), "added keyring");

        self.announce_accounts(&accounts);
        self.full_update().await?;
        Ok(index)
    }

    /// Derive one more account in the keyring at `keyring_index`
    pub async fn add_new_account(
        &mut self,
        keyring_index: usize,
        name: Option<&str>,
    ) -> Result<Address> {
        self.ensure_unlocked()?;

        let keyring = self.keyring_at_mut(keyring_index)?;
        let backup = SerializedKeyringRecord {
            keyring_type: keyring.keyring_type().to_string(),
            data: keyring.serialize().await?,
        };
        let added = keyring.add_accounts(1).await?;
        let held = keyring.accounts().await?;

        let address = match added.into_iter().next() {
            Some(address) if held.contains(&address) => address,
            _ => {
                self.rollback_keyring(keyring_index, backup, false).await?;
                return Err(VaultError::integrity(
                    "derived account missing from keyring accounts",
                ));
            }
        };

        let added = std::slice::from_ref(&address);
        let identities = match self.persist_with_names(added, name).await {
            Ok(identities) => identities,
            Err(e) => {
                warn!(keyring_index, error = %e, "persist failed, rolling back new account");
                self.rollback_keyring(keyring_index, backup, false).await?;
                return Err(e);
            }
        };

        self.memstore.identities = identities;
        self.announce_accounts(added);
        info!(keyring_index, address = %address, "added account");
        self.full_update().await?;
        Ok(address)
    }

    /// Remove an account; an emptied keyring is dropped with it
    pub async fn remove_account(&mut self, address: &Address) -> Result<VaultSnapshot> {
        self.ensure_unlocked()?;

        let index = self.keyring_index_for(address).await?;
        let mut nicknames = self.store.get().await?.nicknames;
        nicknames.remove(address);

        let keyring = self.keyring_at_mut(index)?;
        let backup = SerializedKeyringRecord {
            keyring_type: keyring.keyring_type().to_string(),
            data: keyring.serialize().await?,
        };
        keyring.remove_account(address).await?;
        let emptied = keyring.accounts().await?.is_empty();
        if emptied {
            self.session.keyrings_mut().remove(index);
        }

        if let Err(e) = self.persist_all_keyrings(Some(nicknames)).await {
            warn!(address = %address, error = %e, "persist failed, restoring account");
            self.rollback_keyring(index, backup, emptied).await?;
            return Err(e);
        }

        self.memstore.identities.remove(address);
        info!(address = %address, keyring_dropped = emptied, "removed account");

        self.full_update().await
    }

    /// Rename a live account
    pub async fn set_account_nickname(
        &mut self,
        address: &Address,
        name: &str,
    ) -> Result<VaultSnapshot> {
        self.ensure_unlocked()?;

        let name = name.trim();
        if name.is_empty() {
            return Err(VaultError::validation("name", "nickname cannot be empty"));
        }
        if !self.memstore.identities.contains_key(address) {
            return Err(VaultError::not_found("account", address.to_prefixed()));
        }

        let mut nicknames = self.store.get().await?.nicknames;
        nicknames.insert(address.clone(), name.to_string());
        self.store.update(StateUpdate::nicknames(nicknames)).await?;
        self.memstore
            .identities
            .insert(address.clone(), Identity::new(address.clone(), name));
        debug!(address = %address, "nickname updated");

        self.full_update().await
    }

    /// Every live account, in keyring order
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        collect_accounts(self.session.keyrings()).await
    }

    /// Indices of live keyrings of `keyring_type`
    pub fn keyrings_by_type(&self, keyring_type: &str) -> Vec<usize> {
        self.session
            .keyrings()
            .iter()
            .enumerate()
            .filter(|(_, keyring)| keyring.keyring_type() == keyring_type)
            .map(|(index, _)| index)
            .collect()
    }

    // =========================================================================
    // Signing dispatch
    // =========================================================================

    /// Private key of an account, hex encoded without prefix
    pub async fn export_account(&self, address: &Address) -> Result<Zeroizing<String>> {
        let keyring = self.keyring_for_account(address).await?;
        warn!(address = %address, "exporting private key");
        keyring.export_account(address).await
    }

    pub async fn sign_transaction(
        &self,
        address: &Address,
        tx: &serde_json::Value,
    ) -> Result<SignedTransaction> {
        let keyring = self.keyring_for_account(address).await?;
        debug!(address = %address, "signing transaction");
        keyring.sign_transaction(address, tx).await
    }

    pub async fn sign_message(&self, address: &Address, data: &[u8]) -> Result<String> {
        let keyring = self.keyring_for_account(address).await?;
        debug!(address = %address, "signing message");
        keyring.sign_message(address, data).await
    }

    pub async fn sign_typed_message(
        &self,
        address: &Address,
        data: &serde_json::Value,
    ) -> Result<String> {
        let keyring = self.keyring_for_account(address).await?;
        debug!(address = %address, "signing typed data");
        keyring.sign_typed_data(address, data).await
    }

    /// DID documents of the keyring holding `address`
    pub async fn identity_documents(&self, address: &Address) -> Result<Vec<serde_json::Value>> {
        let keyring = self.keyring_for_account(address).await?;
        keyring.identity_documents().await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_unlocked(&self) -> Result<()> {
        if self.session.is_unlocked() {
            Ok(())
        } else {
            warn!("operation rejected: vault is locked");
            Err(VaultError::Locked)
        }
    }

    fn emit(&self, event: ControllerEvent) {
        debug!(event = %event.summary(), "controller event");
        // Ignore send errors (no receivers)
        let _ = self.events.send(event);
    }

    /// Refresh keyring summaries and broadcast the full state
    async fn full_update(&mut self) -> Result<VaultSnapshot> {
        let mut summaries = Vec::with_capacity(self.session.keyrings().len());
        for keyring in self.session.keyrings() {
            summaries.push(KeyringSummary {
                keyring_type: keyring.keyring_type().to_string(),
                accounts: keyring.accounts().await?,
            });
        }
        self.memstore.keyrings = summaries;
        self.memstore.is_unlocked = self.session.is_unlocked();

        let snapshot = self.snapshot();
        self.emit(ControllerEvent::Update(snapshot.clone()));
        Ok(snapshot)
    }

    /// Persist `keyrings` as the whole vault, then make them the session
    ///
    /// The ciphertext and the names of `accounts` are written in one store
    /// update; nothing in memory changes unless it succeeds.
    async fn install_vault(
        &mut self,
        password: &str,
        keyrings: Vec<Box<dyn Keyring>>,
        accounts: &[Address],
    ) -> Result<()> {
        let records = serialize_keyrings(&keyrings).await?;
        let (nicknames, identities) = self
            .name_accounts(accounts, None, &IdentityMap::new())
            .await?;
        self.write_vault(password, &records, Some(nicknames)).await?;

        self.session = Session::unlocked(password, keyrings);
        self.memstore.clear();
        self.memstore.identities = identities;
        self.announce_accounts(accounts);
        Ok(())
    }

    async fn persist_all_keyrings(&self, nicknames: Option<NicknameMap>) -> Result<()> {
        let records = serialize_keyrings(self.session.keyrings()).await?;
        self.persist_records(records, nicknames).await
    }

    /// Persist all keyrings plus names for `accounts`; returns the new identities
    async fn persist_with_names(
        &self,
        accounts: &[Address],
        name: Option<&str>,
    ) -> Result<IdentityMap> {
        let (nicknames, identities) = self
            .name_accounts(accounts, name, &self.memstore.identities)
            .await?;
        self.persist_all_keyrings(Some(nicknames)).await?;
        Ok(identities)
    }

    async fn persist_records(
        &self,
        records: VaultRecords,
        nicknames: Option<NicknameMap>,
    ) -> Result<()> {
        let password = self.session.password().ok_or(VaultError::Locked)?;
        self.write_vault(password, &records, nicknames).await
    }

    async fn write_vault(
        &self,
        password: &str,
        records: &VaultRecords,
        nicknames: Option<NicknameMap>,
    ) -> Result<()> {
        let payload = serde_json::to_value(records)?;
        let ciphertext = self.encryptor.encrypt(password, &payload).await?;
        self.store
            .update(StateUpdate {
                vault: Some(ciphertext),
                nicknames,
            })
            .await?;
        debug!(keyrings = records.len(), "vault persisted");
        Ok(())
    }

    async fn restore_keyring(&self, record: SerializedKeyringRecord) -> Result<Box<dyn Keyring>> {
        let mut keyring = self.registry.create(&record.keyring_type)?;
        keyring.deserialize(record.data).await?;
        Ok(keyring)
    }

    /// Put a keyring back the way it was before a failed mutation
    async fn rollback_keyring(
        &mut self,
        index: usize,
        backup: SerializedKeyringRecord,
        was_removed: bool,
    ) -> Result<()> {
        let restored = self.restore_keyring(backup).await?;
        let keyrings = self.session.keyrings_mut();
        if was_removed {
            keyrings.insert(index.min(keyrings.len()), restored);
        } else if let Some(slot) = keyrings.get_mut(index) {
            *slot = restored;
        }
        Ok(())
    }

    /// Nickname map and identities with `accounts` named, nothing written
    async fn name_accounts(
        &self,
        accounts: &[Address],
        name: Option<&str>,
        identities: &IdentityMap,
    ) -> Result<(NicknameMap, IdentityMap)> {
        let mut nicknames = self.store.get().await?.nicknames;
        let mut identities = identities.clone();

        for address in accounts {
            let label = resolve_account_name(address, &nicknames, name, &identities);
            nicknames.insert(address.clone(), label.clone());
            identities.insert(address.clone(), Identity::new(address.clone(), label));
        }
        Ok((nicknames, identities))
    }

    fn announce_accounts(&self, accounts: &[Address]) {
        for address in accounts {
            self.emit(ControllerEvent::NewAccount {
                address: address.clone(),
            });
        }
    }

    /// Simple-key imports may not repeat an address already in the vault
    async fn check_for_duplicate(&self, keyring_type: &str, new_accounts: &[Address]) -> Result<()> {
        if keyring_type != SIMPLE_KEYRING_TYPE {
            return Ok(());
        }

        let mut seen = self.accounts().await?;
        for address in new_accounts {
            if seen.contains(address) {
                warn!(address = %address, "rejected duplicate key import");
                return Err(VaultError::Duplicate {
                    address: address.to_prefixed(),
                });
            }
            seen.push(address.clone());
        }
        Ok(())
    }

    fn keyring_at_mut(&mut self, index: usize) -> Result<&mut Box<dyn Keyring>> {
        self.session
            .keyrings_mut()
            .get_mut(index)
            .ok_or_else(|| VaultError::not_found("keyring", index.to_string()))
    }

    async fn keyring_index_for(&self, address: &Address) -> Result<usize> {
        for (index, keyring) in self.session.keyrings().iter().enumerate() {
            if keyring.accounts().await?.contains(address) {
                return Ok(index);
            }
        }
        Err(VaultError::not_found("keyring for account", address.to_prefixed()))
    }

    /// First live keyring holding `address`
    async fn keyring_for_account(&self, address: &Address) -> Result<&dyn Keyring> {
        self.ensure_unlocked()?;
        let index = self.keyring_index_for(address).await?;
        self.session
            .keyrings()
            .get(index)
            .map(|keyring| &**keyring)
            .ok_or_else(|| VaultError::not_found("keyring for account", address.to_prefixed()))
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(VaultError::validation("password", "password cannot be empty"));
    }
    Ok(())
}

fn first_account(accounts: &[Address]) -> Result<Address> {
    accounts
        .first()
        .cloned()
        .ok_or_else(|| VaultError::integrity("new keyring holds no account"))
}

async fn serialize_keyrings(keyrings: &[Box<dyn Keyring>]) -> Result<VaultRecords> {
    let mut records = Vec::with_capacity(keyrings.len());
    for keyring in keyrings {
        records.push(SerializedKeyringRecord {
            keyring_type: keyring.keyring_type().to_string(),
            data: keyring.serialize().await?,
        });
    }
    Ok(records)
}

/// Identities for `accounts`, naming any account without a nickname
///
/// Returns the identities and how many nicknames were added to `nicknames`.
fn build_identities(accounts: &[Address], nicknames: &mut NicknameMap) -> (IdentityMap, usize) {
    let mut identities = IdentityMap::new();
    let mut newly_named = 0;
    for address in accounts {
        let name = resolve_account_name(address, nicknames, None, &identities);
        if !nicknames.contains_key(address) {
            nicknames.insert(address.clone(), name.clone());
            newly_named += 1;
        }
        identities.insert(address.clone(), Identity::new(address.clone(), name));
    }
    (identities, newly_named)
}

async fn collect_accounts(keyrings: &[Box<dyn Keyring>]) -> Result<Vec<Address>> {
    let mut accounts = Vec::new();
    for keyring in keyrings {
        accounts.extend(keyring.accounts().await?);
    }
    Ok(accounts)
}
