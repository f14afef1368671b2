//! Vault session: unlock, CRUD, and master passphrase rotation

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::credential::{
    is_stale, remove, upsert, validate_platform, CredentialEntry, CredentialStore,
    ListedCredential,
};
use crate::crypto::{KdfParams, VaultKey};
use crate::error::{Result, VaultError};
use crate::events::{VaultEvent, VaultObserver};
use crate::generator::generate_secret;
use crate::master::MasterRecord;
use crate::settings::{SettingsManager, VaultSettings};
use crate::storage::VaultDir;

/// Vault state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No master record exists yet
    Uninitialized,
    /// Master record exists, passphrase required
    Locked,
    /// Passphrase verified, key held in memory
    Unlocked,
}

/// An open vault.
///
/// The session is the only owner of the vault key; dropping it zeroizes the
/// key. Every operation reads and rewrites whole files, and nothing locks the
/// storage location: callers must ensure only one session works on a given
/// directory at a time, otherwise the last writer wins.
pub struct VaultSession {
    /// Vault file layout
    dir: VaultDir,
    /// Encrypted credential set
    store: CredentialStore,
    /// Non-sensitive settings
    settings_manager: SettingsManager,
    /// Random identifier of this vault
    identity: String,
    /// KDF parameters for `initialize` (None = defaults)
    kdf_params: Option<KdfParams>,
    /// Presentation layer hook
    observer: Option<Box<dyn VaultObserver>>,
    /// Current vault key (when unlocked)
    key: Option<VaultKey>,
    /// Current state
    state: VaultState,
}

impl VaultSession {
    /// Open the vault stored in `path`, which must be an existing directory.
    ///
    /// A passphrase rotation interrupted by a crash is rolled back first, so
    /// the previous passphrase opens the previous credential set.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let dir = VaultDir::open(path)?;
        if dir.recover_rotation()? {
            warn!("Rolled back an interrupted master passphrase rotation");
        }
        let identity = dir.ensure_identity()?;

        let state = if dir.is_initialized() {
            VaultState::Locked
        } else {
            VaultState::Uninitialized
        };

        let settings_manager = SettingsManager::new(&dir.settings_path());
        let store = CredentialStore::new(dir.clone());

        debug!("Opened vault {} at {:?} ({:?})", identity, dir.root(), state);

        Ok(Self {
            dir,
            store,
            settings_manager,
            identity,
            kdf_params: None,
            observer: None,
            key: None,
            state,
        })
    }

    /// Use custom key derivation parameters when initializing a new vault.
    ///
    /// Existing vaults always use the parameters recorded in their master record.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = Some(params);
        self
    }

    /// Attach an observer for vault events
    pub fn with_observer(mut self, observer: impl VaultObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Get the current vault state
    pub fn state(&self) -> VaultState {
        self.state
    }

    /// Check if the vault is unlocked
    pub fn is_unlocked(&self) -> bool {
        self.state == VaultState::Unlocked
    }

    /// Random identifier of this vault
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        self.dir.root()
    }

    /// Get current settings
    pub fn settings(&self) -> &VaultSettings {
        self.settings_manager.get()
    }

    /// Update settings
    pub fn update_settings(&mut self, settings: VaultSettings) -> Result<()> {
        self.settings_manager.update(settings)
    }

    /// Create the master record for a new vault.
    ///
    /// Leaves the vault locked; call `unlock` to start working with it.
    pub fn initialize(&mut self, passphrase: &str) -> Result<()> {
        if self.state != VaultState::Uninitialized || self.dir.is_initialized() {
            return Err(VaultError::AlreadyInitialized);
        }

        info!("Initializing new vault");

        let (record, _key) = MasterRecord::initialize(passphrase, self.kdf_params)?;
        self.dir.create_master(&record)?;
        self.state = VaultState::Locked;

        self.notify(VaultEvent::Initialized);
        info!("Vault initialized successfully");
        Ok(())
    }

    /// Unlock the vault with the master passphrase.
    ///
    /// A wrong passphrase leaves the state unchanged. There is no attempt limit.
    pub fn unlock(&mut self, passphrase: &str) -> Result<()> {
        let record = self
            .dir
            .load_master()?
            .ok_or(VaultError::NotInitialized)?;

        let key = match record.verify(passphrase) {
            Ok(key) => key,
            Err(e) => {
                if matches!(e, VaultError::AuthenticationFailed) {
                    warn!("Rejected master passphrase for vault {}", self.identity);
                    self.notify(VaultEvent::UnlockFailed);
                }
                return Err(e);
            }
        };

        self.key = Some(key);
        self.state = VaultState::Unlocked;

        self.notify(VaultEvent::Unlocked);
        info!("Vault unlocked successfully");
        Ok(())
    }

    // Every platform operation checks the session before the platform name.

    /// Add a credential, replacing any existing entry for `platform`
    pub fn add(&mut self, platform: &str, secret: &str) -> Result<()> {
        let key = self.key()?;
        validate_platform(platform)?;

        let mut set = self.store.load(key)?;
        upsert(&mut set, platform, secret, Utc::now())?;
        self.store.save(key, &set)?;

        debug!("Saved credential for {}", platform);
        self.notify(VaultEvent::EntrySaved {
            platform: platform.to_string(),
        });
        Ok(())
    }

    /// Replace the secret of an existing credential
    pub fn update(&mut self, platform: &str, secret: &str) -> Result<()> {
        let key = self.key()?;
        validate_platform(platform)?;

        let mut set = self.store.load(key)?;
        if !set.contains_key(platform) {
            return Err(VaultError::NotFound(platform.to_string()));
        }
        upsert(&mut set, platform, secret, Utc::now())?;
        self.store.save(key, &set)?;

        debug!("Updated credential for {}", platform);
        self.notify(VaultEvent::EntrySaved {
            platform: platform.to_string(),
        });
        Ok(())
    }

    /// Delete a credential
    pub fn delete(&mut self, platform: &str) -> Result<()> {
        let key = self.key()?;
        validate_platform(platform)?;

        let mut set = self.store.load(key)?;
        remove(&mut set, platform)?;
        self.store.save(key, &set)?;

        debug!("Deleted credential for {}", platform);
        self.notify(VaultEvent::EntryDeleted {
            platform: platform.to_string(),
        });
        Ok(())
    }

    /// Get a credential by platform name
    pub fn get(&self, platform: &str) -> Result<Option<CredentialEntry>> {
        let key = self.key()?;
        validate_platform(platform)?;
        let mut set = self.store.load(key)?;
        Ok(set.remove(platform))
    }

    /// List all credentials ordered by platform, flagging stale entries
    pub fn list(&self) -> Result<Vec<ListedCredential>> {
        self.list_at(Utc::now())
    }

    /// List all credentials with staleness evaluated at `now`
    pub fn list_at(&self, now: DateTime<Utc>) -> Result<Vec<ListedCredential>> {
        let key = self.key()?;
        let threshold = self.settings().stale_after_days;

        let listed = self
            .store
            .load(key)?
            .into_iter()
            .map(|(platform, entry)| ListedCredential {
                is_stale: is_stale(&entry, now, threshold),
                platform,
                entry,
            })
            .collect();

        Ok(listed)
    }

    /// Generate a random secret; `length` is clamped to 8..=32
    pub fn generate(&self, length: usize) -> String {
        generate_secret(length)
    }

    /// Generate a secret and store it for `platform`.
    ///
    /// Without a length the configured default is used.
    pub fn generate_and_save(&mut self, platform: &str, length: Option<usize>) -> Result<String> {
        let length = length.unwrap_or_else(|| self.settings().effective_secret_length());
        let secret = generate_secret(length);
        self.add(platform, &secret)?;
        Ok(secret)
    }

    /// Change the master passphrase and re-encrypt every credential.
    ///
    /// The new master record and the re-encrypted set are committed together;
    /// on failure the previous files stay authoritative and the held key is unchanged.
    pub fn rotate_master(&mut self, old_passphrase: &str, new_passphrase: &str) -> Result<()> {
        let current_key = self.key()?;
        let record = self
            .dir
            .load_master()?
            .ok_or(VaultError::NotInitialized)?;

        let set = self.store.load(current_key)?;
        let (new_record, new_key) = record.rotate(old_passphrase, new_passphrase)?;

        let staged_vault = self.store.prepare_save(&new_key, &set)?;
        let staged_master = self.dir.stage_master(&new_record)?;
        self.dir.commit_rotation(staged_vault, staged_master)?;

        self.key = Some(new_key);

        self.notify(VaultEvent::MasterRotated);
        info!("Master passphrase changed, {} credentials re-encrypted", set.len());
        Ok(())
    }

    /// Key for an unlocked vault
    fn key(&self) -> Result<&VaultKey> {
        match self.state {
            VaultState::Uninitialized => Err(VaultError::NotInitialized),
            VaultState::Locked => Err(VaultError::Locked),
            VaultState::Unlocked => self.key.as_ref().ok_or(VaultError::Locked),
        }
    }

    fn notify(&self, event: VaultEvent) {
        if let Some(observer) = &self.observer {
            observer.notify(&event);
        }
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("dir", &self.dir.root())
            .field("identity", &self.identity)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
