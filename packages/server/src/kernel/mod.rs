//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod tasks;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenRouterAI;
pub use deps::ServerDeps;
pub use tasks::TokioSpawner;
pub use test_dependencies::{InlineSpawner, MockAI, TestDependencies};
pub use traits::*;
