//! # OpenRouterClient
//!
//! Chat-completion client for an OpenRouter-compatible API. The assistant
//! service picks models and builds prompts; this adapter only moves JSON.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use domains::ports::{CompletionClient, CompletionRequest};
use domains::{DomainError, Result};

pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl OpenRouterClient {
    /// A missing key is allowed at construction; calls fail with an upstream
    /// error instead, so the rest of the platform runs without AI configured.
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| DomainError::upstream("AI API key not configured"))?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::upstream(e))?;

        if !response.status().is_success() {
            return Err(DomainError::upstream(format!(
                "AI provider returned status {}",
                response.status()
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| DomainError::upstream(e))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| DomainError::upstream("AI provider returned no choices"))
    }
}
