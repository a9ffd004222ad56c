//! # storage-adapters
//!
//! Concrete implementations of the `domains` storage ports: an in-memory
//! document store with JSON snapshot persistence, a content-addressed local
//! file store, and a log-only mail transport.

pub mod document;
pub mod mailer;
pub mod media;

pub use document::MemoryDocumentStore;
pub use mailer::LogMailer;
pub use media::LocalFileStore;
