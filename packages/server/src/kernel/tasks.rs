// Background task dispatch
//
// Production implementation of BaseTaskSpawner. Tasks are fire-and-forget:
// failures are the task's own responsibility to log.

use futures::future::BoxFuture;

use super::BaseTaskSpawner;

/// Spawns tasks on the tokio runtime.
pub struct TokioSpawner;

impl BaseTaskSpawner for TokioSpawner {
    fn dispatch(&self, name: &'static str, task: BoxFuture<'static, ()>) {
        tracing::debug!(task = name, "Dispatching background task");
        tokio::spawn(task);
    }
}
