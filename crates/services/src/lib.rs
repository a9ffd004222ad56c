//! # Services
//!
//! Use-case layer. Each service owns one workflow area, talks to storage and
//! external collaborators exclusively through the port traits in `domains`,
//! and is wired together by the binary. Side effects (notifications, email,
//! realtime push) leave the services as [`notifications::OutboundEvent`]s
//! handled by the [`notifications::Notifier`].

pub mod accounts;
pub mod admin;
pub mod assignments;
pub mod assistant;
pub mod chat;
pub mod courses;
pub mod feed;
pub mod notifications;
pub mod saga;

pub use accounts::AccountService;
pub use admin::AdminService;
pub use assignments::AssignmentService;
pub use assistant::AssistantService;
pub use chat::ChatService;
pub use courses::CourseService;
pub use feed::FeedService;
pub use notifications::{Notifier, NotificationService, OutboundEvent};
