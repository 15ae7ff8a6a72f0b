//! Action error taxonomy.
//!
//! Every variant maps to a stable token the moderation UI shows in redirect
//! query strings, so moderators see "not_found" rather than a stack trace.

use crate::domains::moderators::RewriteDenied;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Post not found")]
    NotFound,

    #[error("Nothing to undo")]
    NoUndo,

    #[error("No rewrite available for this post")]
    NoRewrite,

    #[error("AI rewrite failed")]
    RewriteFailed,

    #[error("Latitude and longitude must both be present and in range")]
    InvalidCoordinates,

    #[error("Board notes need a title and text")]
    NotesEmpty,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    RateLimited(RewriteDenied),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ActionError {
    /// Stable token for redirect query strings and JSON error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::NotFound => "not_found",
            ActionError::NoUndo => "no_undo",
            ActionError::NoRewrite => "no_rewrite",
            ActionError::RewriteFailed => "rewrite_failed",
            ActionError::InvalidCoordinates => "invalid_coordinates",
            ActionError::NotesEmpty => "notes_empty",
            ActionError::Validation(_) => "invalid",
            ActionError::RateLimited(RewriteDenied::Disabled) => "rewrite_disabled",
            ActionError::RateLimited(RewriteDenied::PostCap(_)) => "rewrite_limit_post",
            ActionError::RateLimited(RewriteDenied::HourCap(_)) => "rewrite_limit_hour",
            ActionError::Internal(_) => "server_error",
        }
    }
}

impl From<sqlx::Error> for ActionError {
    fn from(e: sqlx::Error) -> Self {
        ActionError::Internal(e.into())
    }
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ActionError::NotFound.code(), "not_found");
        assert_eq!(ActionError::NoUndo.code(), "no_undo");
        assert_eq!(ActionError::NoRewrite.code(), "no_rewrite");
        assert_eq!(ActionError::RewriteFailed.code(), "rewrite_failed");
        assert_eq!(ActionError::InvalidCoordinates.code(), "invalid_coordinates");
        assert_eq!(
            ActionError::RateLimited(RewriteDenied::PostCap(2)).code(),
            "rewrite_limit_post"
        );
        assert_eq!(
            ActionError::RateLimited(RewriteDenied::HourCap(5)).code(),
            "rewrite_limit_hour"
        );
    }
}
