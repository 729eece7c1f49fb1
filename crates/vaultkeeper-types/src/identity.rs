//! Identity types: an account address paired with a display name

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;

/// An account with a human-readable display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub address: Address,
    pub name: String,
}

impl Identity {
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }
}

/// Identities keyed by canonical address
pub type IdentityMap = BTreeMap<Address, Identity>;

/// Plaintext nickname map persisted outside the encrypted vault
pub type NicknameMap = BTreeMap<Address, String>;
