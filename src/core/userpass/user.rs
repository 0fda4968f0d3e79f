// src/core/userpass/user.rs

use crate::core::userpass::policies::PolicyList;
use serde::{Deserialize, Serialize};

/// Represents a single user stored by the credential backend.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct UserEntry {
    /// The username. This is the storage key and never changes.
    pub username: String,
    /// The password hash. Opaque to policy updates.
    #[serde(default)]
    pub password_hash: String,
    /// Policies set through the deprecated `policies` field.
    #[serde(default)]
    pub legacy_policies: PolicyList,
    /// Policies set through the `token_policies` field.
    #[serde(default)]
    pub policies: PolicyList,
}

impl UserEntry {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// The policies a token issued for this user would carry. The current
    /// representation wins; entries written before the migration fall back to
    /// their legacy list.
    pub fn effective_policies(&self) -> &PolicyList {
        if self.policies.is_empty() {
            &self.legacy_policies
        } else {
            &self.policies
        }
    }
}
