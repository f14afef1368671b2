//! On-disk layout of a vault location
//!
//! A vault directory holds:
//! - `master.json`: salt and verifier for the master passphrase
//! - `passwords.enc`: the encrypted credential set
//! - `.usb_id`: random identifier of this vault instance
//! - `settings.json`: non-sensitive settings
//!
//! While a passphrase rotation is committing, `master.json.bak` and
//! `passwords.enc.bak` hold the previous pair. Their presence on open means the
//! rotation never completed, and the previous pair is put back.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::atomic::{atomic_write, StagedWrite};
use crate::error::{Result, VaultError};
use crate::master::MasterRecord;

const MASTER_FILE: &str = "master.json";
const VAULT_FILE: &str = "passwords.enc";
const IDENTITY_FILE: &str = ".usb_id";
const SETTINGS_FILE: &str = "settings.json";
const MASTER_BACKUP_FILE: &str = "master.json.bak";
const VAULT_BACKUP_FILE: &str = "passwords.enc.bak";

/// Handle to a vault storage directory
#[derive(Debug, Clone)]
pub struct VaultDir {
    root: PathBuf,
}

impl VaultDir {
    /// Open an existing directory as a vault location.
    ///
    /// The directory is not created: a missing removable drive must not turn
    /// into a fresh empty vault somewhere else.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.is_dir() {
            return Err(VaultError::StorageError(format!(
                "Storage location {:?} does not exist or is not a directory",
                root
            )));
        }

        Ok(Self { root })
    }

    /// Root directory of the vault
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the master record file
    pub fn master_path(&self) -> PathBuf {
        self.root.join(MASTER_FILE)
    }

    /// Path to the encrypted credential set
    pub fn vault_path(&self) -> PathBuf {
        self.root.join(VAULT_FILE)
    }

    /// Path to the vault identity file
    pub fn identity_path(&self) -> PathBuf {
        self.root.join(IDENTITY_FILE)
    }

    /// Path to the settings file
    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// Check if a master record exists
    pub fn is_initialized(&self) -> bool {
        self.master_path().exists()
    }

    /// Read the vault identity, generating it on first use
    pub fn ensure_identity(&self) -> Result<String> {
        let path = self.identity_path();

        if path.exists() {
            let identity = fs::read_to_string(&path)?.trim().to_string();
            if !identity.is_empty() {
                return Ok(identity);
            }
            warn!("Empty vault identity file, generating a new identity");
        }

        let identity = uuid::Uuid::new_v4().to_string();
        atomic_write(&path, identity.as_bytes())?;
        debug!("Generated vault identity {}", identity);
        Ok(identity)
    }

    /// Load the master record, if the vault is initialized
    pub fn load_master(&self) -> Result<Option<MasterRecord>> {
        let path = self.master_path();

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        MasterRecord::from_json(&bytes).map(Some)
    }

    /// Persist the master record of a new vault
    pub fn create_master(&self, record: &MasterRecord) -> Result<()> {
        if self.is_initialized() {
            return Err(VaultError::AlreadyInitialized);
        }

        atomic_write(&self.master_path(), &record.to_json()?)?;
        debug!("Saved master record to {:?}", self.master_path());
        Ok(())
    }

    /// Stage a replacement master record without committing it
    pub fn stage_master(&self, record: &MasterRecord) -> Result<StagedWrite> {
        StagedWrite::stage(&self.master_path(), &record.to_json()?)
    }

    /// Read the encrypted credential blob, if one has been written
    pub fn read_vault(&self) -> Result<Option<Vec<u8>>> {
        let path = self.vault_path();

        if !path.exists() {
            return Ok(None);
        }

        Ok(Some(fs::read(&path)?))
    }

    /// Stage a replacement credential blob without committing it
    pub fn stage_vault(&self, blob: &[u8]) -> Result<StagedWrite> {
        StagedWrite::stage(&self.vault_path(), blob)
    }

    /// Record the current master record and credential blob before a rotation.
    ///
    /// The credential backup is written first; the master backup marks the
    /// journal complete. An empty credential backup means no blob existed.
    pub fn begin_rotation(&self) -> Result<()> {
        let previous_master = fs::read(self.master_path())?;
        let previous_vault = self.read_vault()?.unwrap_or_default();

        atomic_write(&self.root.join(VAULT_BACKUP_FILE), &previous_vault)?;
        atomic_write(&self.root.join(MASTER_BACKUP_FILE), &previous_master)?;
        debug!("Recorded rotation journal at {:?}", self.root);
        Ok(())
    }

    /// Commit a re-encrypted credential blob and a new master record together.
    ///
    /// Both replacements must already be staged. The rotation counts as
    /// committed once the journal is removed; any failure before that puts the
    /// previous pair back so the old passphrase keeps working.
    pub fn commit_rotation(&self, vault: StagedWrite, master: StagedWrite) -> Result<()> {
        self.begin_rotation()?;

        let committed = vault.commit().and_then(|()| master.commit());
        if let Err(e) = committed {
            warn!("Rotation commit failed, restoring previous vault: {}", e);
            if let Err(restore_err) = self.roll_back_rotation() {
                return Err(VaultError::StorageError(format!(
                    "rotation failed ({}) and the previous vault could not be restored ({})",
                    e, restore_err
                )));
            }
            return Err(e);
        }

        fs::remove_file(self.root.join(MASTER_BACKUP_FILE))?;
        if let Err(e) = fs::remove_file(self.root.join(VAULT_BACKUP_FILE)) {
            warn!("Failed to remove credential backup: {}", e);
        }

        debug!("Committed rotated vault at {:?}", self.root);
        Ok(())
    }

    /// Undo a rotation left unfinished by a crash.
    ///
    /// Returns `true` when the previous master record and credential blob were
    /// restored.
    pub fn recover_rotation(&self) -> Result<bool> {
        let master_backup = self.root.join(MASTER_BACKUP_FILE);
        let vault_backup = self.root.join(VAULT_BACKUP_FILE);

        if master_backup.exists() {
            warn!("Found an interrupted passphrase rotation, restoring previous vault");
            self.roll_back_rotation()?;
            return Ok(true);
        }

        // Journal never completed: nothing was committed
        if vault_backup.exists() {
            debug!("Removing incomplete rotation journal");
            fs::remove_file(&vault_backup)?;
        }
        Ok(false)
    }

    /// Put the journaled pair back. The master backup is moved last so an
    /// interrupted rollback is resumed by the next `recover_rotation`.
    fn roll_back_rotation(&self) -> Result<()> {
        let vault_backup = self.root.join(VAULT_BACKUP_FILE);

        if vault_backup.exists() {
            if fs::metadata(&vault_backup)?.len() == 0 {
                if self.vault_path().exists() {
                    fs::remove_file(self.vault_path())?;
                }
                fs::remove_file(&vault_backup)?;
            } else {
                fs::rename(&vault_backup, self.vault_path())?;
            }
        }

        fs::rename(self.root.join(MASTER_BACKUP_FILE), self.master_path())?;
        Ok(())
    }
}
