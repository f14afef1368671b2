//! Vault file layout and crash-safe persistence
//!
//! Every write replaces a whole file through a temp file and a rename, so a
//! crash mid-write leaves the last good file in place.

mod atomic;
mod vault_dir;

pub use atomic::{atomic_write, StagedWrite};
pub use vault_dir::VaultDir;
