//! Vaultkeeper Controller - Credential vault and keyring orchestration
//!
//! The [`KeyringController`] owns pluggable keyrings, persists them only as
//! one password-encrypted vault, keeps display names for every account, and
//! routes signing requests to whichever keyring holds the requested address.
//!
//! # Example
//!
//! ```ignore
//! use vaultkeeper_controller::{ControllerConfig, KeyringController};
//!
//! let mut controller = KeyringController::from_config(&ControllerConfig::from_env())?;
//! let snapshot = controller.create_new_vault_and_keychain("Main", "correct horse").await?;
//! let address = snapshot.accounts()[0].clone();
//! let signature = controller.sign_message(&address, b"hello").await?;
//! controller.lock();
//! ```

pub mod config;
pub mod controller;
pub mod gas;
pub mod identity;
pub mod session;
pub mod state;

pub use config::*;
pub use controller::*;
pub use gas::*;
pub use state::*;

pub use vaultkeeper_crypto::{Encryptor, EncryptorConfig, PasswordEncryptor};
pub use vaultkeeper_keyring::{
    HdKeyring, Keyring, KeyringRegistry, SimpleKeyring, HD_KEYRING_TYPE, SIMPLE_KEYRING_TYPE,
};
pub use vaultkeeper_store::{MemoryStore, PersistedState, SledStore, StateUpdate, Store};
pub use vaultkeeper_types::*;

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber for embedding binaries
///
/// Honors `RUST_LOG`; otherwise logs the vaultkeeper crates at `info`.
/// Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "vaultkeeper_controller=info,vaultkeeper_store=info,vaultkeeper_keyring=info,vaultkeeper_crypto=info",
        )
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
