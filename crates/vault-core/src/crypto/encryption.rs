//! AES-256-GCM authenticated encryption
//!
//! Blob format: `[version][iv][auth_tag][ciphertext]`
//! - Version: 1 byte, authenticated as associated data
//! - IV: 12 bytes (96 bits) - standard for GCM
//! - Auth tag: 16 bytes (128 bits)
//! - Ciphertext: variable length

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::VaultKey;
use crate::error::{Result, VaultError};

/// Current blob format version
pub const FORMAT_VERSION: u8 = 1;

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + IV_LEN + TAG_LEN;

/// Encrypted data with IV and auth tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    /// Initialization vector (12 bytes for GCM)
    pub iv: [u8; IV_LEN],
    /// Authentication tag (16 bytes)
    pub auth_tag: [u8; TAG_LEN],
    /// Encrypted ciphertext
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Serialize into the self-contained blob format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.auth_tag);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse from the blob format.
    ///
    /// Only structural checks happen here; integrity is established by `decrypt`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(VaultError::DecryptionFailed);
        }
        if bytes[0] != FORMAT_VERSION {
            return Err(VaultError::DecryptionFailed);
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&bytes[1..1 + IV_LEN]);

        let mut auth_tag = [0u8; TAG_LEN];
        auth_tag.copy_from_slice(&bytes[1 + IV_LEN..HEADER_LEN]);

        Ok(Self {
            iv,
            auth_tag,
            ciphertext: bytes[HEADER_LEN..].to_vec(),
        })
    }
}

/// Encrypt plaintext using AES-256-GCM
///
/// # Arguments
/// * `plaintext` - The data to encrypt
/// * `key` - The 256-bit encryption key
///
/// # Returns
/// Encrypted data containing IV, auth tag, and ciphertext
pub fn encrypt(plaintext: &[u8], key: &VaultKey) -> Result<EncryptedData> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    // Fresh random IV for every encryption
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext_with_tag = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &[FORMAT_VERSION],
            },
        )
        .map_err(|e| VaultError::EncryptionError(e.to_string()))?;

    if ciphertext_with_tag.len() < TAG_LEN {
        return Err(VaultError::EncryptionError("Ciphertext too short".to_string()));
    }

    let tag_start = ciphertext_with_tag.len() - TAG_LEN;
    let ciphertext = ciphertext_with_tag[..tag_start].to_vec();
    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&ciphertext_with_tag[tag_start..]);

    Ok(EncryptedData {
        iv,
        auth_tag,
        ciphertext,
    })
}

/// Decrypt ciphertext using AES-256-GCM
///
/// Fails with `DecryptionFailed` when the data was tampered with, truncated,
/// or encrypted under a different key.
pub fn decrypt(encrypted: &EncryptedData, key: &VaultKey) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::DecryptionFailed)?;

    let nonce = Nonce::from_slice(&encrypted.iv);

    // Reconstruct ciphertext with tag appended (as expected by aes-gcm)
    let mut ciphertext_with_tag = encrypted.ciphertext.clone();
    ciphertext_with_tag.extend_from_slice(&encrypted.auth_tag);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext_with_tag.as_slice(),
                aad: &[FORMAT_VERSION],
            },
        )
        .map_err(|_| VaultError::DecryptionFailed)
}

/// Encrypt and serialize into a single blob
pub fn encrypt_blob(plaintext: &[u8], key: &VaultKey) -> Result<Vec<u8>> {
    Ok(encrypt(plaintext, key)?.to_bytes())
}

/// Parse and decrypt a blob produced by `encrypt_blob`
pub fn decrypt_blob(blob: &[u8], key: &VaultKey) -> Result<Vec<u8>> {
    let encrypted = EncryptedData::from_bytes(blob)?;
    decrypt(&encrypted, key)
}
