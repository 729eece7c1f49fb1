//! Keyring type registry
//!
//! Maps a keyring type tag to the factory that builds an empty keyring of that
//! type. Registration is additive: new keyring types plug in without touching
//! the controller.

use tracing::debug;

use vaultkeeper_types::{Result, VaultError};

use crate::hd::{HdKeyring, HD_KEYRING_TYPE};
use crate::simple::{SimpleKeyring, SIMPLE_KEYRING_TYPE};
use crate::Keyring;

/// Builds an empty keyring, ready for `deserialize`
pub type KeyringFactory = fn() -> Box<dyn Keyring>;

/// Tag → factory lookup table
#[derive(Clone)]
pub struct KeyringRegistry {
    /// Registration order is preserved for `supported_types`
    factories: Vec<(String, KeyringFactory)>,
}

impl KeyringRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Register (or replace) the factory for a type tag
    pub fn register(&mut self, keyring_type: impl Into<String>, factory: KeyringFactory) -> &mut Self {
        let keyring_type = keyring_type.into();
        debug!(keyring_type = %keyring_type, "registering keyring type");
        match self.factories.iter_mut().find(|(tag, _)| *tag == keyring_type) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((keyring_type, factory)),
        }
        self
    }

    /// Look up the factory for a type tag
    pub fn lookup(&self, keyring_type: &str) -> Result<KeyringFactory> {
        self.factories
            .iter()
            .find(|(tag, _)| tag == keyring_type)
            .map(|(_, factory)| *factory)
            .ok_or_else(|| VaultError::UnsupportedKeyringType {
                keyring_type: keyring_type.to_string(),
            })
    }

    /// Build an empty keyring of the given type
    pub fn create(&self, keyring_type: &str) -> Result<Box<dyn Keyring>> {
        Ok(self.lookup(keyring_type)?())
    }

    /// Registered type tags, in registration order
    pub fn supported_types(&self) -> Vec<String> {
        self.factories.iter().map(|(tag, _)| tag.clone()).collect()
    }
}

impl Default for KeyringRegistry {
    /// Registry with the shipped HD and simple key pair keyrings
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(HD_KEYRING_TYPE, HdKeyring::factory)
            .register(SIMPLE_KEYRING_TYPE, SimpleKeyring::factory);
        registry
    }
}
