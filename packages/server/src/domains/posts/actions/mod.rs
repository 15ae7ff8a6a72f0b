// Actions - orchestration over ServerDeps; one function per moderation verb

pub mod board;
pub mod error;
pub mod moderation;
pub mod rewrite;
pub mod submit;

pub use board::{get_board, get_dashboard};
pub use error::{ActionError, ActionResult};
pub use rewrite::{editor_rewrite, rewrite_post, RewriteActor, RewriteMode};
pub use submit::{submit_post, SubmitInput, SubmitOutcome};
