// src/core/store/memory.rs

use super::{CasOutcome, IdentityStore, Versioned};
use crate::core::UserpassError;
use crate::core::userpass::user::UserEntry;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// An in-memory identity store. Writes to a single key are serialized by the
/// map's shard locks, so `put_if_version` is atomic per username.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, Versioned<UserEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get(&self, username: &str) -> Result<Option<Versioned<UserEntry>>, UserpassError> {
        Ok(self.users.get(username).map(|slot| slot.value().clone()))
    }

    async fn put(&self, username: &str, entry: UserEntry) -> Result<(), UserpassError> {
        match self.users.entry(username.to_string()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                slot.version += 1;
                slot.value = entry;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Versioned {
                    version: 1,
                    value: entry,
                });
            }
        }
        Ok(())
    }

    async fn put_if_version(
        &self,
        username: &str,
        entry: UserEntry,
        expected_version: u64,
    ) -> Result<CasOutcome, UserpassError> {
        let Some(mut slot) = self.users.get_mut(username) else {
            // Deleted since it was read.
            return Ok(CasOutcome::Conflict);
        };
        if slot.version != expected_version {
            return Ok(CasOutcome::Conflict);
        }
        slot.version += 1;
        slot.value = entry;
        Ok(CasOutcome::Applied)
    }
}
