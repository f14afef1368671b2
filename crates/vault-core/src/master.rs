//! Master record: salt plus verifier digest for the master passphrase
//!
//! The verifier is `sha256(derived_key)`, so a candidate passphrase can be
//! checked without storing the passphrase or the key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::crypto::{derive_key, generate_salt, KdfParams, VaultKey, DEFAULT_ITERATIONS, SALT_LEN};
use crate::error::{Result, VaultError};

/// Length of the verifier digest in bytes
pub const VERIFIER_LEN: usize = 32;

/// Persisted master record (`master.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRecord {
    /// Random salt for key derivation
    #[serde(with = "b64_array")]
    salt: [u8; SALT_LEN],

    /// SHA-256 digest of the derived key
    #[serde(with = "b64_array")]
    verifier: [u8; VERIFIER_LEN],

    /// PBKDF2 iteration count, omitted when it is the default
    #[serde(
        default = "default_iterations",
        skip_serializing_if = "is_default_iterations"
    )]
    iterations: u32,
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn is_default_iterations(iterations: &u32) -> bool {
    *iterations == DEFAULT_ITERATIONS
}

fn verifier_for(key: &VaultKey) -> [u8; VERIFIER_LEN] {
    Sha256::digest(key.as_bytes()).into()
}

fn require_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.is_empty() {
        return Err(VaultError::InvalidParameters(
            "master passphrase must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl MasterRecord {
    /// Create a record for a new passphrase with a fresh salt.
    ///
    /// Returns the record to persist together with the derived key.
    pub fn initialize(passphrase: &str, params: Option<KdfParams>) -> Result<(Self, VaultKey)> {
        require_passphrase(passphrase)?;

        let params = params.unwrap_or_default();
        let salt = generate_salt();
        let key = derive_key(passphrase, &salt, Some(params))?;

        let record = Self {
            salt,
            verifier: verifier_for(&key),
            iterations: params.iterations,
        };

        debug!("Created master record ({} iterations)", params.iterations);
        Ok((record, key))
    }

    /// Check a candidate passphrase and return its key on match
    pub fn verify(&self, candidate: &str) -> Result<VaultKey> {
        let key = derive_key(candidate, &self.salt, Some(self.kdf_params()))?;
        let candidate_verifier = verifier_for(&key);

        if bool::from(candidate_verifier.ct_eq(&self.verifier)) {
            Ok(key)
        } else {
            Err(VaultError::AuthenticationFailed)
        }
    }

    /// Replace the passphrase: verify `old`, then build a new record with a new salt.
    ///
    /// The caller must re-encrypt the credential set under the returned key and
    /// persist both in one transaction.
    pub fn rotate(&self, old: &str, new: &str) -> Result<(Self, VaultKey)> {
        self.verify(old)?;
        Self::initialize(new, Some(self.kdf_params()))
    }

    /// Key derivation parameters recorded for this vault
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.iterations,
        }
    }

    /// Serialize to the `master.json` form
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parse the `master.json` form
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let record: Self = serde_json::from_slice(bytes).map_err(|e| {
            VaultError::VaultCorruptedOrWrongKey(format!("invalid master record: {}", e))
        })?;

        if record.iterations == 0 {
            return Err(VaultError::VaultCorruptedOrWrongKey(
                "invalid master record: zero iterations".to_string(),
            ));
        }
        Ok(record)
    }
}

/// Base64 (standard alphabet) encoding for fixed-size byte arrays
mod b64_array {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> std::result::Result<[u8; N], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)?;

        decoded.as_slice().try_into().map_err(|_| {
            serde::de::Error::custom(format!("expected {} bytes, got {}", N, decoded.len()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine};

    fn fast() -> Option<KdfParams> {
        Some(KdfParams { iterations: 1_000 })
    }

    #[test]
    fn test_verify_correct_passphrase() {
        let (record, key) = MasterRecord::initialize("correct-horse", None).unwrap();

        let verified = record.verify("correct-horse").unwrap();
        assert_eq!(verified.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_verify_wrong_passphrase() {
        let (record, _) = MasterRecord::initialize("correct-horse", fast()).unwrap();

        for candidate in ["wrong-pass", "correct-hors", "correct-horse ", "Correct-horse"] {
            assert!(matches!(
                record.verify(candidate),
                Err(VaultError::AuthenticationFailed)
            ));
        }
    }

    #[test]
    fn test_verifier_is_digest_of_key() {
        let (record, key) = MasterRecord::initialize("pw", fast()).unwrap();
        let expected: [u8; 32] = Sha256::digest(key.as_bytes()).into();
        assert_eq!(record.verifier, expected);
    }

    #[test]
    fn test_initialize_uses_fresh_salt() {
        let (a, _) = MasterRecord::initialize("pw", fast()).unwrap();
        let (b, _) = MasterRecord::initialize("pw", fast()).unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.verifier, b.verifier);
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(
            MasterRecord::initialize("", fast()),
            Err(VaultError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rotate() {
        let (record, _) = MasterRecord::initialize("old", fast()).unwrap();

        let (rotated, new_key) = record.rotate("old", "new").unwrap();
        assert_ne!(rotated.salt, record.salt);
        assert_eq!(rotated.kdf_params(), record.kdf_params());
        assert_eq!(rotated.verify("new").unwrap().as_bytes(), new_key.as_bytes());
        assert!(matches!(
            rotated.verify("old"),
            Err(VaultError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_rotate_requires_old_passphrase() {
        let (record, _) = MasterRecord::initialize("old", fast()).unwrap();

        assert!(matches!(
            record.rotate("not-old", "new"),
            Err(VaultError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_json_default_iterations_omitted() {
        let (record, _) = MasterRecord::initialize("pw", None).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&record.to_json().unwrap()).unwrap();

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(
            STANDARD.decode(object["salt"].as_str().unwrap()).unwrap().len(),
            SALT_LEN
        );
        assert_eq!(
            STANDARD.decode(object["verifier"].as_str().unwrap()).unwrap().len(),
            VERIFIER_LEN
        );
        assert_eq!(MasterRecord::from_json(&record.to_json().unwrap()).unwrap(), record);
    }

    #[test]
    fn test_json_custom_iterations_kept() {
        let (record, _) = MasterRecord::initialize("pw", fast()).unwrap();
        let parsed = MasterRecord::from_json(&record.to_json().unwrap()).unwrap();

        assert_eq!(parsed.kdf_params().iterations, 1_000);
        assert!(parsed.verify("pw").is_ok());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let bad: [&[u8]; 4] = [
            b"not json",
            br#"{"salt":"AAAA","verifier":"AAAA"}"#,
            br#"{"salt":"!!!","verifier":"!!!"}"#,
            br#"{"salt":"AAAAAAAAAAAAAAAAAAAAAA=="}"#,
        ];

        for bytes in bad {
            assert!(matches!(
                MasterRecord::from_json(bytes),
                Err(VaultError::VaultCorruptedOrWrongKey(_))
            ));
        }
    }
}
