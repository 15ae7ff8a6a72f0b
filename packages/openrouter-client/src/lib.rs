//! Pure OpenRouter REST API client
//!
//! A clean, minimal client for the OpenRouter chat completions API with no
//! domain-specific logic. OpenRouter speaks the OpenAI wire format, so the
//! types here mirror that shape.
//!
//! # Example
//!
//! ```rust,ignore
//! use openrouter_client::{OpenRouterClient, ChatRequest, Message};
//!
//! let client = OpenRouterClient::from_env()?;
//!
//! let response = client.chat_completion(ChatRequest {
//!     model: "anthropic/claude-3.5-haiku".into(),
//!     messages: vec![Message::user("Hello!")],
//!     ..Default::default()
//! }).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OpenRouterError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// How long a connectivity ping waits before giving up.
const PING_TIMEOUT: Duration = Duration::from_secs(15);

/// Pure OpenRouter API client.
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    /// Sent as HTTP-Referer, used by OpenRouter for app rankings.
    referer: Option<String>,
    /// Sent as X-Title.
    app_title: Option<String>,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: None,
            app_title: None,
        }
    }

    /// Create from environment variable `OPENROUTER_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| OpenRouterError::Config("OPENROUTER_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies or testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the HTTP-Referer header value.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Set the X-Title header value.
    pub fn with_app_title(mut self, title: impl Into<String>) -> Self {
        self.app_title = Some(title.into());
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completions API and get a response. The
    /// request's `timeout` bounds the whole round trip.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let timeout = request.timeout;

        let mut builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(timeout);

        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.app_title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(model = %request.model, "OpenRouter request timed out");
                OpenRouterError::Timeout(timeout)
            } else {
                warn!(error = %e, "OpenRouter request failed");
                OpenRouterError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // Error bodies can be arbitrarily large HTML; keep them log-sized.
            let error_text = truncate_to_char_boundary(&error_text, 2048);
            warn!(status = %status, error = %error_text, "OpenRouter API error");
            return Err(OpenRouterError::Api(format!(
                "OpenRouter API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenRouterError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OpenRouterError::Api("No response content from OpenRouter".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenRouter chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }

    /// Connectivity test against a specific model.
    ///
    /// Sends a trivial prompt with a short deadline. Succeeds if the model
    /// returns any content at all.
    pub async fn ping(&self, model: &str) -> Result<()> {
        let request = ChatRequest::new(model)
            .message(Message::user("Respond with exactly: OK"))
            .max_tokens(10)
            .timeout(PING_TIMEOUT);

        let response = self.chat_completion(request).await?;
        if response.content.trim().is_empty() {
            return Err(OpenRouterError::Api("Empty ping response".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenRouterClient::new("sk-or-test")
            .with_base_url("https://custom.api.com")
            .with_referer("https://board.example.org")
            .with_app_title("Community Board");

        assert_eq!(client.api_key, "sk-or-test");
        assert_eq!(client.base_url, "https://custom.api.com");
        assert_eq!(client.referer.as_deref(), Some("https://board.example.org"));
        assert_eq!(client.app_title.as_deref(), Some("Community Board"));
    }

    #[test]
    fn test_default_base_url() {
        let client = OpenRouterClient::new("sk-or-test");
        assert_eq!(client.base_url(), "https://openrouter.ai/api/v1");
    }
}
