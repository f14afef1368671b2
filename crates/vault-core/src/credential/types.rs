//! Credential type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plaintext credential set: platform name -> entry, ordered by platform
pub type CredentialSet = BTreeMap<String, CredentialEntry>;

/// A stored credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    /// The stored secret value
    #[serde(rename = "password")]
    pub secret: String,

    /// Set on every create or update
    #[serde(rename = "date")]
    pub updated_at: DateTime<Utc>,
}

impl CredentialEntry {
    /// Create an entry stamped with `now`
    pub fn new(secret: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            updated_at: now,
        }
    }

    /// Whole days since the last update
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.updated_at).num_days()
    }
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("secret", &"[REDACTED]")
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// One row of a vault listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedCredential {
    /// Platform name
    pub platform: String,
    /// The stored entry
    pub entry: CredentialEntry,
    /// Whether the entry is older than the staleness threshold
    pub is_stale: bool,
}
