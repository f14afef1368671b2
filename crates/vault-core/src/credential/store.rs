//! Credential store: whole-set load and save through the vault codec

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::types::{CredentialEntry, CredentialSet};
use crate::crypto::{decrypt_blob, encrypt_blob, VaultKey};
use crate::error::{Result, VaultError};
use crate::storage::{StagedWrite, VaultDir};

/// Default age after which an entry is reported as stale
pub const DEFAULT_STALE_AFTER_DAYS: u32 = 180;

/// Reads and writes the encrypted credential set of one vault
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: VaultDir,
}

impl CredentialStore {
    /// Create a store over a vault directory
    pub fn new(dir: VaultDir) -> Self {
        Self { dir }
    }

    /// Load and decrypt the credential set.
    ///
    /// A vault that has never been saved yields an empty set.
    pub fn load(&self, key: &VaultKey) -> Result<CredentialSet> {
        let Some(blob) = self.dir.read_vault()? else {
            debug!("No credential file yet, starting empty");
            return Ok(CredentialSet::new());
        };

        let plaintext = decrypt_blob(&blob, key).map_err(|_| {
            VaultError::VaultCorruptedOrWrongKey("authentication check failed".to_string())
        })?;

        let set: CredentialSet = serde_json::from_slice(&plaintext).map_err(|e| {
            VaultError::VaultCorruptedOrWrongKey(format!("invalid credential payload: {}", e))
        })?;

        debug!("Loaded {} credentials", set.len());
        Ok(set)
    }

    /// Encrypt and atomically replace the persisted credential set
    pub fn save(&self, key: &VaultKey, set: &CredentialSet) -> Result<()> {
        self.prepare_save(key, set)?.commit()?;
        debug!("Saved {} credentials", set.len());
        Ok(())
    }

    /// Encrypt and stage the credential set without replacing the current file
    pub fn prepare_save(&self, key: &VaultKey, set: &CredentialSet) -> Result<StagedWrite> {
        let plaintext = serde_json::to_vec(set)?;
        let blob = encrypt_blob(&plaintext, key)?;
        self.dir.stage_vault(&blob)
    }
}

/// Check a platform name is usable as a key
pub fn validate_platform(platform: &str) -> Result<()> {
    if platform.trim().is_empty() {
        return Err(VaultError::InvalidPlatformName);
    }
    Ok(())
}

/// Set or replace the entry for `platform`, stamped with `now`
pub fn upsert(
    set: &mut CredentialSet,
    platform: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    validate_platform(platform)?;
    set.insert(platform.to_string(), CredentialEntry::new(secret, now));
    Ok(())
}

/// Remove the entry for `platform`
pub fn remove(set: &mut CredentialSet, platform: &str) -> Result<CredentialEntry> {
    set.remove(platform)
        .ok_or_else(|| VaultError::NotFound(platform.to_string()))
}

/// Whether `entry` is older than `threshold_days` at `now`
pub fn is_stale(entry: &CredentialEntry, now: DateTime<Utc>, threshold_days: u32) -> bool {
    now - entry.updated_at > Duration::days(i64::from(threshold_days))
}
