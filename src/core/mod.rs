// src/core/mod.rs

//! The central module containing the core logic and data structures of the backend.

pub mod errors;
pub mod store;
pub mod userpass;

pub use errors::UserpassError;
