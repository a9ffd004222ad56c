//! # AppState
//!
//! Shared handles for every handler. Cloning is cheap; each field sits
//! behind an [`Arc`].

use std::sync::Arc;

use domains::ports::{TokenAuthority, UserRepo};
use services::{
    AccountService, AdminService, AssignmentService, AssistantService, ChatService, CourseService,
    FeedService, NotificationService,
};

use crate::metrics::ApiMetrics;
use crate::ws::Gateway;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminService>,
    pub assignments: Arc<AssignmentService>,
    pub assistant: Arc<AssistantService>,
    pub chat: Arc<ChatService>,
    pub courses: Arc<CourseService>,
    pub feed: Arc<FeedService>,
    pub notifications: Arc<NotificationService>,
    pub users: Arc<dyn UserRepo>,
    pub tokens: Arc<dyn TokenAuthority>,
    pub gateway: Arc<Gateway>,
    pub metrics: Arc<ApiMetrics>,
}
