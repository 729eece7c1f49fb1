//! Vaultkeeper Types - Canonical domain types for the credential vault
//!
//! This crate contains the foundational types shared by every vaultkeeper
//! crate, with zero dependencies on the others:
//!
//! - Canonical account addresses
//! - Serialized keyring records and public keyring summaries
//! - Identities and the plaintext nickname map
//! - The error taxonomy
//!
//! # Invariants
//!
//! 1. Addresses are compared and stored in canonical (unprefixed, lowercase) form
//! 2. Keyring secret material only ever appears inside `SerializedKeyringRecord::data`,
//!    which is persisted encrypted

pub mod address;
pub mod error;
pub mod identity;
pub mod keyring;

pub use address::*;
pub use error::*;
pub use identity::*;
pub use keyring::*;
