// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;

use super::{BaseAI, BaseTaskSpawner};

// =============================================================================
// Mock AI (Generic LLM capabilities)
// =============================================================================

pub struct MockAI {
    responses: Arc<Mutex<Vec<Result<String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    ping_result: Arc<Mutex<Option<String>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            ping_result: Arc::new(Mutex::new(None)),
        }
    }

    /// Add a text response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Ok(response.into()));
        self
    }

    /// Add a JSON response to the queue (will be serialized)
    pub fn with_json_response<T: serde::Serialize>(self, data: &T) -> Self {
        let json = serde_json::to_string(data).expect("Failed to serialize mock response");
        self.responses.lock().unwrap().push(Ok(json));
        self
    }

    /// Add an error to the queue
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Err(anyhow::anyhow!(message.into())));
        self
    }

    /// Make subsequent pings fail with the given message
    pub fn with_ping_error(self, message: impl Into<String>) -> Self {
        *self.ping_result.lock().unwrap() = Some(message.into());
        self
    }

    /// Get all prompts that were sent to the AI
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the last prompt sent to the AI
    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Check if a prompt containing the given text was sent
    pub fn was_called_with(&self, text: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|p| p.contains(text))
    }

    /// Get the number of times the AI was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, _model: &str, prompt: &str, _temperature: f32) -> Result<String> {
        // Record the call
        self.calls.lock().unwrap().push(prompt.to_string());

        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            responses.remove(0)
        } else {
            // Return default mock response
            Ok("Mock AI response".to_string())
        }
    }

    async fn ping(&self, _model: &str) -> Result<()> {
        match self.ping_result.lock().unwrap().as_ref() {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Inline Task Spawner
// =============================================================================

/// Runs dispatched tasks inline so tests observe their effects synchronously.
pub struct InlineSpawner {
    dispatched: Arc<Mutex<Vec<&'static str>>>,
}

impl InlineSpawner {
    pub fn new() -> Self {
        Self {
            dispatched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Names of tasks that were dispatched, in order.
    pub fn dispatched(&self) -> Vec<&'static str> {
        self.dispatched.lock().unwrap().clone()
    }
}

impl Default for InlineSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseTaskSpawner for InlineSpawner {
    fn dispatch(&self, name: &'static str, task: BoxFuture<'static, ()>) {
        self.dispatched.lock().unwrap().push(name);
        futures::executor::block_on(task);
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub ai: Arc<MockAI>,
    pub tasks: Arc<InlineSpawner>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            ai: Arc::new(MockAI::new()),
            tasks: Arc::new(InlineSpawner::new()),
        }
    }

    /// Set a mock AI
    pub fn mock_ai(mut self, ai: MockAI) -> Self {
        self.ai = Arc::new(ai);
        self
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_ai_queues_responses_in_order() {
        let ai = MockAI::new()
            .with_response("first")
            .with_error("provider down")
            .with_response("third");

        tokio_test::block_on(async {
            assert_eq!(ai.complete("m", "p1", 0.0).await.unwrap(), "first");
            assert!(ai.complete("m", "p2", 0.0).await.is_err());
            assert_eq!(ai.complete("m", "p3", 0.0).await.unwrap(), "third");
            // Queue exhausted falls back to the default response
            assert_eq!(ai.complete("m", "p4", 0.0).await.unwrap(), "Mock AI response");
        });

        assert_eq!(ai.call_count(), 4);
        assert!(ai.was_called_with("p2"));
        assert_eq!(ai.last_prompt().as_deref(), Some("p4"));
    }

    #[test]
    fn test_mock_ai_ping() {
        let ok = MockAI::new();
        tokio_test::block_on(async {
            assert!(ok.ping("m").await.is_ok());
        });

        let failing = MockAI::new().with_ping_error("401");
        tokio_test::block_on(async {
            assert!(failing.ping("m").await.is_err());
        });
    }

    #[test]
    fn test_inline_spawner_runs_tasks_synchronously() {
        let spawner = InlineSpawner::new();
        let ran = Arc::new(Mutex::new(false));
        let ran_clone = ran.clone();
        spawner.dispatch(
            "unit_test_task",
            Box::pin(async move {
                *ran_clone.lock().unwrap() = true;
            }),
        );
        assert!(*ran.lock().unwrap());
        assert_eq!(spawner.dispatched(), vec!["unit_test_task"]);
    }

    #[test]
    fn test_json_response_round_trips() {
        #[derive(serde::Serialize)]
        struct Payload {
            ok: bool,
        }
        let ai = MockAI::new().with_json_response(&Payload { ok: true });
        tokio_test::block_on(async {
            let response = ai.complete("m", "p", 0.0).await.unwrap();
            assert_eq!(response, r#"{"ok":true}"#);
        });
    }
}
