//! # Mailer
//!
//! Log-only `Mailer`: every send lands in the structured log instead of an
//! SMTP pipe. Deployments that want real delivery drop in their own adapter.

use async_trait::async_trait;

use domains::ports::Mailer;
use domains::Result;

#[derive(Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        tracing::info!(to, subject, body_len = body.len(), "email (log only)");
        Ok(())
    }
}
