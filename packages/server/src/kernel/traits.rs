// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "analyze this tip") should be domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseTaskSpawner)

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with a specific model (returns raw text response).
    /// Callers parse JSON themselves with serde_json::from_str.
    async fn complete(&self, model: &str, prompt: &str, temperature: f32) -> Result<String>;

    /// Connectivity test against a specific model.
    async fn ping(&self, model: &str) -> Result<()>;
}

// =============================================================================
// Task Spawner Trait (Infrastructure - fire-and-forget background work)
// =============================================================================

/// Dispatches background tasks that outlive the request that started them.
///
/// The production implementation hands the future to the tokio runtime; the
/// test implementation runs it inline so assertions see its effects.
pub trait BaseTaskSpawner: Send + Sync {
    fn dispatch(&self, name: &'static str, task: BoxFuture<'static, ()>);
}
