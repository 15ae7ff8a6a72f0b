//! Server dependencies for effects (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! actions. External services use trait abstractions to enable testing.

use std::sync::Arc;

use sqlx::PgPool;

use crate::kernel::{BaseAI, BaseTaskSpawner};

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// AI client for analysis and rewrite prompts. `None` when no API key is
    /// configured; submissions then skip pre-screening entirely.
    pub ai: Option<Arc<dyn BaseAI>>,
    /// Dispatcher for fire-and-forget background work (post analysis).
    pub tasks: Arc<dyn BaseTaskSpawner>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        db_pool: PgPool,
        ai: Option<Arc<dyn BaseAI>>,
        tasks: Arc<dyn BaseTaskSpawner>,
    ) -> Self {
        Self { db_pool, ai, tasks }
    }
}
