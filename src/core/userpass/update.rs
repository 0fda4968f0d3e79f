// src/core/userpass/update.rs

//! Updating the policy assignment of an existing user.

use crate::core::UserpassError;
use crate::core::store::{CasOutcome, IdentityStore, Versioned};
use crate::core::userpass::fields::{
    self, LEGACY_POLICIES_FIELD, TOKEN_POLICIES_FIELD, validate_username,
};
use crate::core::userpass::policies::PolicyInput;
use crate::core::userpass::user::UserEntry;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_WRITE_ATTEMPTS: usize = 3;

/// Returned when both the current and the deprecated field are supplied.
pub const DEPRECATED_POLICIES_IGNORED_WARNING: &str =
    "Both 'token_policies' and deprecated 'policies' values supplied, ignoring the deprecated value";

/// A request to change the policies of `username`. A `None` field was not supplied,
/// which is different from a supplied empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePoliciesRequest {
    pub username: String,
    /// The deprecated `policies` field.
    pub legacy_policies: Option<PolicyInput>,
    /// The `token_policies` field.
    pub token_policies: Option<PolicyInput>,
}

impl UpdatePoliciesRequest {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            legacy_policies: None,
            token_policies: None,
        }
    }

    pub fn with_legacy_policies(mut self, input: impl Into<PolicyInput>) -> Self {
        self.legacy_policies = Some(input.into());
        self
    }

    pub fn with_token_policies(mut self, input: impl Into<PolicyInput>) -> Self {
        self.token_policies = Some(input.into());
        self
    }

    /// Builds a request from raw request fields, validating the username and the
    /// shape of both policy fields.
    pub fn from_fields(
        username: &str,
        request_fields: &Map<String, Value>,
    ) -> Result<Self, UserpassError> {
        validate_username(username)?;
        Ok(Self {
            username: username.to_string(),
            legacy_policies: fields::comma_string_slice(request_fields, LEGACY_POLICIES_FIELD)?,
            token_policies: fields::comma_string_slice(request_fields, TOKEN_POLICIES_FIELD)?,
        })
    }

    /// Classifies which of the two representations the caller supplied.
    pub fn precedence(&self) -> PolicyPrecedence<'_> {
        match (&self.token_policies, &self.legacy_policies) {
            (Some(current), None) => PolicyPrecedence::OnlyCurrent(current),
            (Some(current), Some(_)) => PolicyPrecedence::Both(current),
            (None, Some(legacy)) => PolicyPrecedence::OnlyLegacy(legacy),
            (None, None) => PolicyPrecedence::Neither,
        }
    }
}

/// Which policy fields a request carries. Computed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyPrecedence<'a> {
    OnlyCurrent(&'a PolicyInput),
    OnlyLegacy(&'a PolicyInput),
    /// The deprecated value is dropped; only the current one is kept.
    Both(&'a PolicyInput),
    Neither,
}

impl PolicyPrecedence<'_> {
    /// Applies the decision to `entry`, returning the warning to surface, if any.
    /// The representation that is not set is always cleared.
    pub fn apply(&self, entry: &mut UserEntry) -> Option<String> {
        match self {
            PolicyPrecedence::OnlyCurrent(current) => {
                entry.policies = current.normalize();
                entry.legacy_policies.clear();
                None
            }
            PolicyPrecedence::Both(current) => {
                entry.policies = current.normalize();
                entry.legacy_policies.clear();
                Some(DEPRECATED_POLICIES_IGNORED_WARNING.to_string())
            }
            PolicyPrecedence::OnlyLegacy(legacy) => {
                entry.legacy_policies = legacy.normalize();
                entry.policies.clear();
                None
            }
            PolicyPrecedence::Neither => None,
        }
    }
}

/// The successful outcome of an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResponse {
    pub warning: Option<String>,
}

/// Applies policy updates against an injected identity store.
pub struct PolicyUpdater<S: IdentityStore + ?Sized> {
    store: Arc<S>,
    max_write_attempts: usize,
}

impl<S: IdentityStore + ?Sized> PolicyUpdater<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// How many read-modify-write cycles to try before giving up on a contended key.
    /// Values below 1 are treated as 1.
    pub fn with_max_write_attempts(mut self, attempts: usize) -> Self {
        self.max_write_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Loads the user, applies the policy precedence rules to a private copy and
    /// writes it back under the same key.
    ///
    /// The write is conditional on the version that was read; if another writer
    /// got there first the cycle restarts from fresh state. Storage errors are
    /// returned as-is and never retried. A missing user fails before any write.
    pub async fn update_policies(
        &self,
        request: &UpdatePoliciesRequest,
    ) -> Result<UpdateResponse, UserpassError> {
        validate_username(&request.username)?;
        let precedence = request.precedence();
        debug!(
            "Updating policies for '{}': {:?}",
            request.username, precedence
        );

        for attempt in 1..=self.max_write_attempts {
            let Some(Versioned {
                version,
                value: mut entry,
            }) = self.store.get(&request.username).await?
            else {
                return Err(UserpassError::UserNotFound(request.username.clone()));
            };

            let warning = precedence.apply(&mut entry);

            match self
                .store
                .put_if_version(&request.username, entry, version)
                .await?
            {
                CasOutcome::Applied => {
                    if let Some(w) = &warning {
                        warn!("User '{}': {}", request.username, w);
                    }
                    info!("Updated policies for user '{}'.", request.username);
                    return Ok(UpdateResponse { warning });
                }
                CasOutcome::Conflict => {
                    warn!(
                        "Concurrent write to user '{}' (attempt {}/{}), retrying.",
                        request.username, attempt, self.max_write_attempts
                    );
                }
            }
        }

        Err(UserpassError::WriteConflict(format!(
            "user '{}' was modified concurrently {} times",
            request.username, self.max_write_attempts
        )))
    }
}
