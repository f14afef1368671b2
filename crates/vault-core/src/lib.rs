//! # vault-core
//!
//! Cryptographic storage engine for passvault, a local single-user credential vault:
//! - PBKDF2-HMAC-SHA256 key derivation and a stored passphrase verifier
//! - AES-256-GCM authenticated encryption of the whole credential set
//! - Crash-safe file persistence with temp-file-then-rename writes
//! - A session object that owns the vault key and zeroizes it on drop

pub mod credential;
pub mod crypto;
pub mod error;
pub mod events;
pub mod generator;
pub mod master;
pub mod session;
pub mod settings;
pub mod storage;

pub use credential::{CredentialEntry, CredentialSet, CredentialStore, ListedCredential};
pub use crypto::{decrypt, derive_key, encrypt, generate_salt, KdfParams, VaultKey};
pub use error::{Result, VaultError};
pub use events::{VaultEvent, VaultObserver};
pub use generator::generate_secret;
pub use master::MasterRecord;
pub use session::{VaultSession, VaultState};
pub use settings::{SettingsManager, VaultSettings};
pub use storage::VaultDir;
