// src/core/store/file.rs

//! A JSON-file identity store. The whole user table lives in one document that is
//! rewritten through a temporary file and an atomic rename on every write.

use super::{CasOutcome, IdentityStore, Versioned};
use crate::core::UserpassError;
use crate::core::userpass::user::UserEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// On-disk layout of the users file.
#[derive(Serialize, Deserialize, Debug, Default)]
struct UsersFile {
    #[serde(default)]
    users: BTreeMap<String, StoredUser>,
}

#[derive(Serialize, Deserialize, Debug)]
struct StoredUser {
    version: u64,
    #[serde(flatten)]
    entry: UserEntry,
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<UsersFile, UserpassError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<UsersFile, UserpassError> {
            match std::fs::read_to_string(&path) {
                Ok(contents) if contents.trim().is_empty() => Ok(UsersFile::default()),
                Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                    UserpassError::Serialization(format!(
                        "Failed to parse users file '{}': {e}",
                        path.display()
                    ))
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(
                        "Users file '{}' not found; treating it as empty.",
                        path.display()
                    );
                    Ok(UsersFile::default())
                }
                Err(e) => Err(e.into()),
            }
        })
        .await?
    }

    async fn save(&self, file: UsersFile) -> Result<(), UserpassError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), UserpassError> {
            let json_string = serde_json::to_string_pretty(&file)?;

            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }

            let temp_path =
                PathBuf::from(format!("{}.tmp-{}", path.display(), rand::random::<u32>()));

            std::fs::write(&temp_path, json_string)?;

            if let Err(e) = std::fs::rename(&temp_path, &path) {
                let _ = std::fs::remove_file(&temp_path);
                return Err(e.into());
            }

            info!("Users file saved to '{}'", path.display());
            Ok(())
        })
        .await?
    }
}

#[async_trait]
impl IdentityStore for FileStore {
    async fn get(&self, username: &str) -> Result<Option<Versioned<UserEntry>>, UserpassError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        Ok(file.users.remove(username).map(|stored| Versioned {
            version: stored.version,
            value: stored.entry,
        }))
    }

    async fn put(&self, username: &str, entry: UserEntry) -> Result<(), UserpassError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let version = file.users.get(username).map_or(0, |u| u.version) + 1;
        file.users
            .insert(username.to_string(), StoredUser { version, entry });
        self.save(file).await
    }

    async fn put_if_version(
        &self,
        username: &str,
        entry: UserEntry,
        expected_version: u64,
    ) -> Result<CasOutcome, UserpassError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let Some(current) = file.users.get(username) else {
            return Ok(CasOutcome::Conflict);
        };
        if current.version != expected_version {
            return Ok(CasOutcome::Conflict);
        }
        let version = expected_version + 1;
        file.users
            .insert(username.to_string(), StoredUser { version, entry });
        self.save(file).await?;
        Ok(CasOutcome::Applied)
    }
}
