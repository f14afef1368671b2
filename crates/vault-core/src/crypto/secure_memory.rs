//! Secure memory handling with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a vault key in bytes
pub const KEY_LEN: usize = 32;

/// Symmetric vault key - automatically zeroed when dropped.
///
/// Not `Clone`: the unlocked session is the only owner.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; KEY_LEN],
}

impl VaultKey {
    /// Create a new vault key from raw bytes
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
