//! Canonical account addresses
//!
//! Addresses are 20-byte Ethereum-style account identifiers. Internally they
//! are always held in canonical form: 40 lowercase hex digits, no `0x` prefix.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::VaultError;

/// Byte length of an account address
pub const ADDRESS_LEN: usize = 20;

/// A canonical (unprefixed, lowercase) account address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(String);

impl Address {
    /// Parse an address with or without `0x` prefix, in any case
    pub fn parse(s: &str) -> Result<Self, VaultError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(VaultError::validation(
                "address",
                format!("expected {} hex digits, got {}", ADDRESS_LEN * 2, digits.len()),
            ));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VaultError::validation("address", "contains non-hex characters"));
        }

        Ok(Self(digits.to_ascii_lowercase()))
    }

    /// Build from raw address bytes
    pub fn from_bytes(bytes: &[u8; ADDRESS_LEN]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Canonical form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x`-prefixed form for external consumers
    pub fn to_prefixed(&self) -> String {
        format!("0x{}", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
