// AI implementation backed by OpenRouter
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in domain layers.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use openrouter_client::{ChatRequest, Message, OpenRouterClient};

use super::BaseAI;

/// OpenRouter implementation of AI capabilities.
#[derive(Clone)]
pub struct OpenRouterAI {
    client: Arc<OpenRouterClient>,
}

impl OpenRouterAI {
    pub fn new(client: Arc<OpenRouterClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BaseAI for OpenRouterAI {
    async fn complete(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        tracing::debug!(
            model = model,
            prompt_length = prompt.len(),
            "Calling OpenRouter for completion"
        );

        let request = ChatRequest::new(model)
            .message(Message::user(prompt))
            .temperature(temperature);

        let response = self
            .client
            .chat_completion(request)
            .await
            .context("OpenRouter completion failed")?;

        Ok(response.content)
    }

    async fn ping(&self, model: &str) -> Result<()> {
        self.client
            .ping(model)
            .await
            .context("OpenRouter ping failed")
    }
}
