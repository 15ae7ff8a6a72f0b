//! Typed ID definitions for all domain entities.
//!
//! This module defines type aliases for each domain entity, providing
//! compile-time type safety for ID usage throughout the application.
//!
//! # Example
//!
//! ```rust
//! use server_core::common::{PostId, ModeratorId};
//!
//! // These are incompatible types - compiler prevents mixing them up
//! let post_id: PostId = PostId::new();
//! let moderator_id: ModeratorId = ModeratorId::new();
//!
//! // This would be a compile error:
//! // let wrong: ModeratorId = post_id;
//! ```

// Re-export the core Id type and version markers
pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Post entities (tips and notices on the board).
pub struct Post;

/// Marker type for Submitter entities (anonymous tip authors).
pub struct Submitter;

/// Marker type for Moderator entities (board moderator accounts).
pub struct Moderator;

/// Marker type for RewriteLog entities (editor rewrite usage records).
pub struct RewriteLog;

/// Marker type for AuditEntry entities (moderation audit trail rows).
pub struct AuditEntry;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Post entities.
pub type PostId = Id<Post>;

/// Typed ID for Submitter entities.
pub type SubmitterId = Id<Submitter>;

/// Typed ID for Moderator entities.
pub type ModeratorId = Id<Moderator>;

/// Typed ID for RewriteLog entities.
pub type RewriteLogId = Id<RewriteLog>;

/// Typed ID for AuditEntry entities.
pub type AuditEntryId = Id<AuditEntry>;
