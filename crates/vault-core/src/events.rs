//! Notifications for the presentation layer
//!
//! Front ends implement `VaultObserver` to render progress and outcomes.
//! Events never carry secrets or key material.

/// Something that happened to an open vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    /// A new master record was written
    Initialized,
    /// The master passphrase was accepted
    Unlocked,
    /// A passphrase attempt was rejected
    UnlockFailed,
    /// An entry was created or replaced
    EntrySaved { platform: String },
    /// An entry was removed
    EntryDeleted { platform: String },
    /// The master passphrase was changed
    MasterRotated,
}

/// Receives vault events
pub trait VaultObserver: Send {
    /// Called once the operation the event describes has completed
    fn notify(&self, event: &VaultEvent);
}

impl<F> VaultObserver for F
where
    F: Fn(&VaultEvent) + Send,
{
    fn notify(&self, event: &VaultEvent) {
        self(event)
    }
}
