// src/core/store/mod.rs

//! The identity store: key-value persistence of `UserEntry` records keyed by username.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::config::{StorageBackend, StorageConfig};
use crate::core::UserpassError;
use crate::core::userpass::user::UserEntry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// A stored value together with the version it was read at.
///
/// Versions start at 1 on the first write of a key and increase by one on every
/// subsequent write. Stores that cannot track versions report 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// The result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write was applied.
    Applied,
    /// The stored version no longer matched; nothing was written.
    Conflict,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Reads the entry for `username`, or `None` if no such user exists.
    async fn get(&self, username: &str) -> Result<Option<Versioned<UserEntry>>, UserpassError>;

    /// Unconditionally writes `entry` under `username`, replacing any prior value.
    async fn put(&self, username: &str, entry: UserEntry) -> Result<(), UserpassError>;

    /// Writes `entry` only if the stored version still equals `expected_version`.
    ///
    /// The default implementation cannot check versions and degrades to `put`,
    /// giving last-writer-wins semantics.
    async fn put_if_version(
        &self,
        username: &str,
        entry: UserEntry,
        _expected_version: u64,
    ) -> Result<CasOutcome, UserpassError> {
        self.put(username, entry).await?;
        Ok(CasOutcome::Applied)
    }
}

/// Opens the store selected by the configuration.
pub fn open_store(config: &StorageConfig) -> Arc<dyn IdentityStore> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory identity store.");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::File => {
            info!("Using file identity store at '{}'.", config.path);
            Arc::new(FileStore::new(&config.path))
        }
    }
}
