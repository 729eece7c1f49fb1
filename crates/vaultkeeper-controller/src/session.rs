//! The unlocked session: password plus live keyrings
//!
//! `is_unlocked()` holds iff a password is held. Dropping a session zeroizes
//! the password buffer; keyring key material is scrubbed by the keyrings'
//! own drop impls.

use std::fmt;

use zeroize::Zeroizing;

use vaultkeeper_keyring::Keyring;

/// Secrets owned by one controller while unlocked
#[derive(Default)]
pub struct Session {
    password: Option<Zeroizing<String>>,
    keyrings: Vec<Box<dyn Keyring>>,
}

impl Session {
    /// Session for a freshly decrypted (or freshly created) vault
    pub fn unlocked(password: &str, keyrings: Vec<Box<dyn Keyring>>) -> Self {
        Self {
            password: Some(Zeroizing::new(password.to_string())),
            keyrings,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.password.is_some()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }

    pub fn keyrings(&self) -> &[Box<dyn Keyring>] {
        &self.keyrings
    }

    pub fn keyrings_mut(&mut self) -> &mut Vec<Box<dyn Keyring>> {
        &mut self.keyrings
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("is_unlocked", &self.is_unlocked())
            .field(
                "keyrings",
                &self.keyrings.iter().map(|k| k.keyring_type()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
