//! Vault settings management
//!
//! Stores non-sensitive configuration in a plain JSON file next to the vault.
//! Settings are accessible even when the vault is locked.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::credential::DEFAULT_STALE_AFTER_DAYS;
use crate::error::Result;
use crate::generator::{MAX_SECRET_LEN, MIN_SECRET_LEN};
use crate::storage::atomic_write;

/// Vault settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultSettings {
    /// Settings file version
    pub version: u32,
    /// Age in days after which an entry is flagged for rotation
    pub stale_after_days: u32,
    /// Length used when generating a secret without an explicit length
    pub default_secret_length: usize,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            version: 1,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            default_secret_length: 16,
        }
    }
}

impl VaultSettings {
    /// Default secret length, clamped to the generator's bounds
    pub fn effective_secret_length(&self) -> usize {
        self.default_secret_length.clamp(MIN_SECRET_LEN, MAX_SECRET_LEN)
    }
}

/// Settings manager
#[derive(Debug)]
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: VaultSettings,
}

impl SettingsManager {
    /// Load settings from `settings_file`, falling back to defaults
    pub fn new(settings_file: &Path) -> Self {
        let settings = match Self::load_from_file(settings_file) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings file {:?}: {}", settings_file, e);
                VaultSettings::default()
            }
        };

        Self {
            settings_file: settings_file.to_path_buf(),
            settings,
        }
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<VaultSettings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(VaultSettings::default());
        }

        let contents = std::fs::read(path)?;
        let settings: VaultSettings = serde_json::from_slice(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_vec_pretty(&self.settings)?;
        atomic_write(&self.settings_file, &contents)?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &VaultSettings {
        &self.settings
    }

    /// Update settings and save
    pub fn update(&mut self, settings: VaultSettings) -> Result<()> {
        self.settings = settings;
        self.save()
    }
}
