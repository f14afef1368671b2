//! Cryptographic primitives for the vault
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - PBKDF2-HMAC-SHA256 key derivation from passphrases
//! - Secure memory handling with zeroize

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{decrypt, decrypt_blob, encrypt, encrypt_blob, EncryptedData, FORMAT_VERSION};
pub use key_derivation::{
    derive_key, generate_salt, KdfParams, DEFAULT_ITERATIONS, SALT_LEN,
};
pub use secure_memory::{VaultKey, KEY_LEN};
