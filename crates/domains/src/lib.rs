//! # domains
//!
//! The central domain layer for EduBridge: document models, the error
//! taxonomy, port traits implemented by the adapter crates, and the pure
//! authorization policy.
//!
//! Nothing in this crate performs I/O. Adapters depend on it; it depends on
//! no adapter.

pub mod error;
pub mod models;
pub mod policy;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::{DomainError, Result};
pub use models::*;
pub use ports::*;
