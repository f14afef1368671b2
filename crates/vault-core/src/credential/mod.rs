//! Credential set storage and freshness policy

mod store;
mod types;

pub use store::{
    is_stale, remove, upsert, validate_platform, CredentialStore, DEFAULT_STALE_AFTER_DAYS,
};
pub use types::*;
