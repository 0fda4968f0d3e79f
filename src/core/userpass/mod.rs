// src/core/userpass/mod.rs

//! The username/password credential backend: user entries, their policy lists,
//! and the `users/{username}/policies` update path.

pub mod backend;
pub mod fields;
pub mod policies;
pub mod update;
pub mod user;

pub use backend::UserpassBackend;
pub use policies::{PolicyInput, PolicyList};
pub use update::{PolicyUpdater, UpdatePoliciesRequest, UpdateResponse};
pub use user::UserEntry;
