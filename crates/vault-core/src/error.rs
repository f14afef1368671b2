//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Vault is already initialized at this location")]
    AlreadyInitialized,

    #[error("Vault is not initialized - create a new vault first")]
    NotInitialized,

    #[error("Vault is locked - unlock with the master passphrase first")]
    Locked,

    #[error("Invalid master passphrase")]
    AuthenticationFailed,

    #[error("Vault is corrupted or was encrypted with a different key: {0}")]
    VaultCorruptedOrWrongKey(String),

    #[error("Platform name must not be empty")]
    InvalidPlatformName,

    #[error("Platform not found: {0}")]
    NotFound(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
