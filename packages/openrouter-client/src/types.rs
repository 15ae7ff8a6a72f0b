//! OpenRouter API request and response types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Chat Completion
// =============================================================================

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model slug (e.g., "anthropic/claude-3.5-haiku")
    pub model: String,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens in completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-request deadline, not part of the wire format.
    #[serde(skip)]
    pub timeout: Duration,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ChatRequest {
    /// Create a new chat request with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the conversation.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the per-request deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Response content
    pub content: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

/// Raw chat response from API (for internal parsing).
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessageResponse {
    // Some providers return null content on refusals.
    pub content: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Total tokens used
    pub total_tokens: u32,
}

// =============================================================================
// Utilities
// =============================================================================

/// Strip markdown code fences from a model response.
///
/// Models frequently wrap JSON output in ``` fences even when asked not to.
pub fn strip_code_blocks(response: &str) -> &str {
    let mut body = response.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // The remainder of the fence line is a language tag in whatever
        // casing the model chose (json, JSON, javascript, ...).
        body = match rest.split_once('\n') {
            Some((_, after_fence)) => after_fence,
            None => rest,
        };
    }
    body.trim_end_matches("```").trim()
}

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let sys = Message::system("You are a moderator");
        assert_eq!(sys.role, "system");

        let user = Message::user("Hello");
        assert_eq!(user.role, "user");

        let assistant = Message::assistant("Hi there");
        assert_eq!(assistant.role, "assistant");
    }

    #[test]
    fn test_chat_request_builder() {
        let req = ChatRequest::new("anthropic/claude-3.5-haiku")
            .message(Message::user("Hello"))
            .temperature(0.3)
            .max_tokens(800)
            .timeout(Duration::from_secs(15));

        assert_eq!(req.model, "anthropic/claude-3.5-haiku");
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.temperature, Some(0.3));
        assert_eq!(req.max_tokens, Some(800));
        assert_eq!(req.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_timeout_not_serialized() {
        let req = ChatRequest::new("test/model").message(Message::user("hi"));
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("timeout").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
        assert_eq!(strip_code_blocks("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_blocks_any_language_tag() {
        assert_eq!(strip_code_blocks("```JSON\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```Json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```javascript\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
    }
}
