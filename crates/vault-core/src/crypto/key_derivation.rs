//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::secure_memory::{VaultKey, KEY_LEN};
use crate::error::{Result, VaultError};

/// Length of a vault salt in bytes
pub const SALT_LEN: usize = 16;

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Parameters for PBKDF2 key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Iteration count (default: 100,000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit vault key from a passphrase
///
/// # Arguments
/// * `passphrase` - The master passphrase
/// * `salt` - The vault salt (use `generate_salt()` to create one)
/// * `params` - Optional key derivation parameters
///
/// # Returns
/// A 32-byte key suitable for AES-256 encryption
pub fn derive_key(passphrase: &str, salt: &[u8], params: Option<KdfParams>) -> Result<VaultKey> {
    let params = params.unwrap_or_default();

    if salt.is_empty() {
        return Err(VaultError::InvalidParameters(
            "salt must not be empty".to_string(),
        ));
    }
    if params.iterations == 0 {
        return Err(VaultError::InvalidParameters(
            "iteration count must be non-zero".to_string(),
        ));
    }

    let mut key_bytes = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, params.iterations, &mut key_bytes);

    Ok(VaultKey::new(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Option<KdfParams> {
        Some(KdfParams { iterations: 1_000 })
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();

        assert_eq!(salt1.len(), SALT_LEN);
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let salt = generate_salt();

        let key1 = derive_key("test-password-123", &salt, None).unwrap();
        let key2 = derive_key("test-password-123", &salt, None).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_passwords() {
        let salt = generate_salt();

        let key1 = derive_key("password1", &salt, fast()).unwrap();
        let key2 = derive_key("password2", &salt, fast()).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salts() {
        let key1 = derive_key("test-password", &generate_salt(), fast()).unwrap();
        let key2 = derive_key("test-password", &generate_salt(), fast()).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_no_collisions_across_sample() {
        let salt = generate_salt();
        let mut seen = std::collections::HashSet::new();

        for i in 0..32 {
            let key = derive_key(&format!("passphrase-{i}"), &salt, fast()).unwrap();
            assert!(seen.insert(*key.as_bytes()));
        }
    }

    #[test]
    fn test_iterations_change_output() {
        let salt = generate_salt();

        let key1 = derive_key("pw", &salt, Some(KdfParams { iterations: 1_000 })).unwrap();
        let key2 = derive_key("pw", &salt, Some(KdfParams { iterations: 1_001 })).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_known_vector() {
        // RFC 7914 section 11, PBKDF2-HMAC-SHA256 with c = 1
        let key = derive_key("passwd", b"salt", Some(KdfParams { iterations: 1 })).unwrap();
        assert_eq!(
            &key.as_bytes()[..8],
            &[0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }

    #[test]
    fn test_empty_salt_rejected() {
        let result = derive_key("pw", &[], None);
        assert!(matches!(result, Err(VaultError::InvalidParameters(_))));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = derive_key("pw", &generate_salt(), Some(KdfParams { iterations: 0 }));
        assert!(matches!(result, Err(VaultError::InvalidParameters(_))));
    }
}
