// src/core/userpass/backend.rs

use crate::config::Config;
use crate::core::UserpassError;
use crate::core::store::{IdentityStore, open_store};
use crate::core::userpass::fields::POLICIES_PATH;
use crate::core::userpass::update::{PolicyUpdater, UpdatePoliciesRequest, UpdateResponse};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Entry point for requests routed to the credential backend.
pub struct UserpassBackend {
    updater: PolicyUpdater<dyn IdentityStore>,
}

impl UserpassBackend {
    pub fn new(store: Arc<dyn IdentityStore>, config: &Config) -> Self {
        Self {
            updater: PolicyUpdater::new(store)
                .with_max_write_attempts(config.policies.max_write_attempts),
        }
    }

    /// Opens the configured store and builds a backend around it.
    pub fn from_config(config: &Config) -> Self {
        Self::new(open_store(&config.storage), config)
    }

    pub fn store(&self) -> &Arc<dyn IdentityStore> {
        self.updater.store()
    }

    /// Handles an update on `users/{username}/policies`.
    pub async fn handle_update(
        &self,
        path: &str,
        request_fields: &Map<String, Value>,
    ) -> Result<UpdateResponse, UserpassError> {
        let username = POLICIES_PATH
            .match_path(path)
            .ok_or_else(|| UserpassError::UnsupportedPath(path.to_string()))?;
        let request = UpdatePoliciesRequest::from_fields(&username, request_fields)?;
        self.updater.update_policies(&request).await
    }
}
