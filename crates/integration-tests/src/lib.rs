//! # Integration tests
//!
//! Full-stack flows over the real router wired to in-memory adapters: every
//! request goes through routing, extraction, the services layer and the
//! document store exactly as in production, with only the AI completion
//! client replaced by a scripted stand-in.
//!
//! ```bash
//! cargo test -p integration-tests
//! ```

#[cfg(test)]
mod flows;
