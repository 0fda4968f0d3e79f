// src/core/errors.rs

//! Defines the primary error type for the credential backend.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures of a backend operation.
#[derive(Error, Debug)]
pub enum UserpassError {
    #[error("username does not exist: {0}")]
    UserNotFound(String),

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Storage Error: {0}")]
    Storage(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("invalid username '{0}'")]
    InvalidUsername(String),

    #[error("unsupported path '{0}'")]
    UnsupportedPath(String),

    #[error("invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// A compare-and-swap write kept losing against concurrent writers.
    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}

impl UserpassError {
    /// True for failures raised by the storage layer rather than by request handling.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            UserpassError::Io(_) | UserpassError::Storage(_) | UserpassError::Serialization(_)
        )
    }
}

// `std::io::Error` is not cloneable, so it is shared behind an Arc.
impl Clone for UserpassError {
    fn clone(&self) -> Self {
        match self {
            UserpassError::UserNotFound(s) => UserpassError::UserNotFound(s.clone()),
            UserpassError::Io(e) => UserpassError::Io(Arc::clone(e)),
            UserpassError::Storage(s) => UserpassError::Storage(s.clone()),
            UserpassError::Serialization(s) => UserpassError::Serialization(s.clone()),
            UserpassError::InvalidUsername(s) => UserpassError::InvalidUsername(s.clone()),
            UserpassError::UnsupportedPath(s) => UserpassError::UnsupportedPath(s.clone()),
            UserpassError::InvalidField { field, reason } => UserpassError::InvalidField {
                field: field.clone(),
                reason: reason.clone(),
            },
            UserpassError::WriteConflict(s) => UserpassError::WriteConflict(s.clone()),
            UserpassError::Internal(s) => UserpassError::Internal(s.clone()),
        }
    }
}

impl PartialEq for UserpassError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UserpassError::Io(e1), UserpassError::Io(e2)) => e1.to_string() == e2.to_string(),
            (UserpassError::UserNotFound(s1), UserpassError::UserNotFound(s2)) => s1 == s2,
            (UserpassError::Storage(s1), UserpassError::Storage(s2)) => s1 == s2,
            (UserpassError::Serialization(s1), UserpassError::Serialization(s2)) => s1 == s2,
            (UserpassError::InvalidUsername(s1), UserpassError::InvalidUsername(s2)) => s1 == s2,
            (UserpassError::UnsupportedPath(s1), UserpassError::UnsupportedPath(s2)) => s1 == s2,
            (
                UserpassError::InvalidField {
                    field: f1,
                    reason: r1,
                },
                UserpassError::InvalidField {
                    field: f2,
                    reason: r2,
                },
            ) => f1 == f2 && r1 == r2,
            (UserpassError::WriteConflict(s1), UserpassError::WriteConflict(s2)) => s1 == s2,
            (UserpassError::Internal(s1), UserpassError::Internal(s2)) => s1 == s2,
            _ => false,
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for UserpassError {
    fn from(e: std::io::Error) -> Self {
        UserpassError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for UserpassError {
    fn from(e: serde_json::Error) -> Self {
        UserpassError::Serialization(format!(
            "JSON serialization/deserialization error: {e}"
        ))
    }
}

impl From<tokio::task::JoinError> for UserpassError {
    fn from(e: tokio::task::JoinError) -> Self {
        UserpassError::Internal(format!("storage task panicked: {e}"))
    }
}
