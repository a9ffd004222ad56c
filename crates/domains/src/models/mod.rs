//! # Domain Models
//!
//! These structs represent the documents EduBridge persists. Identifiers are
//! UUID v4; timestamps are UTC. Embedded lists (enrollments, ratings, chat
//! participants, transcript entries) live inside their owning document the
//! way the underlying document store keeps them.

mod assignment;
mod chat;
mod conversation;
mod course;
mod feed;
mod notification;
mod user;

pub use assignment::*;
pub use chat::*;
pub use conversation::*;
pub use course::*;
pub use feed::*;
pub use notification::*;
pub use user::*;
