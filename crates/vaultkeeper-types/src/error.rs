//! Error types for Vaultkeeper
//!
//! Every failure surfaces to the caller as an explicit `VaultError`.
//! Nothing is retried or swallowed inside the controller.

use thiserror::Error;

/// Result type for Vaultkeeper operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vaultkeeper error types
#[derive(Debug, Clone, Error)]
pub enum VaultError {
    // ========================================================================
    // Input Errors
    // ========================================================================

    /// Malformed input (password, seed phrase, nickname, hex quantity)
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ========================================================================
    // Vault Errors
    // ========================================================================

    /// Decryption failed: wrong password or corrupted vault
    #[error("Authentication failed: incorrect password or corrupted vault")]
    Authentication,

    /// Vault is locked and the operation needs decrypted keyrings
    #[error("Vault is locked")]
    Locked,

    /// Requested resource does not exist
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// No factory registered for this keyring type
    #[error("Unsupported keyring type: {keyring_type}")]
    UnsupportedKeyringType { keyring_type: String },

    /// Account is already held by a live keyring
    #[error("Duplicate account: {address} is already imported")]
    Duplicate { address: String },

    /// Keyring state disagrees with what the controller expected
    #[error("Integrity error: {reason}")]
    Integrity { reason: String },

    // ========================================================================
    // Collaborator Errors
    // ========================================================================

    /// A keyring capability rejected the call
    #[error("Keyring error: {reason}")]
    Keyring { reason: String },

    /// The durable store failed
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    /// Payload could not be (de)serialized
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// Encryption primitive failed (not a password mismatch)
    #[error("Encryption error: {reason}")]
    Encryption { reason: String },
}

/// Coarse error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    NotFound,
    Duplicate,
    Integrity,
    Locked,
    Internal,
}

impl VaultError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a keyring error
    pub fn keyring(reason: impl Into<String>) -> Self {
        Self::Keyring {
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage {
            reason: reason.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity {
            reason: reason.into(),
        }
    }

    /// Map onto the coarse taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authentication => ErrorKind::Authentication,
            Self::Locked => ErrorKind::Locked,
            Self::NotFound { .. } | Self::UnsupportedKeyringType { .. } => ErrorKind::NotFound,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::Keyring { .. }
            | Self::Storage { .. }
            | Self::Serialization { .. }
            | Self::Encryption { .. } => ErrorKind::Internal,
        }
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Locked => "VAULT_LOCKED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::UnsupportedKeyringType { .. } => "UNSUPPORTED_KEYRING_TYPE",
            Self::Duplicate { .. } => "DUPLICATE_ACCOUNT",
            Self::Integrity { .. } => "INTEGRITY_ERROR",
            Self::Keyring { .. } => "KEYRING_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Encryption { .. } => "ENCRYPTION_ERROR",
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            reason: e.to_string(),
        }
    }
}
