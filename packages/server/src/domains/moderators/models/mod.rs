// Data models - row structs and ALL SQL for the moderators domain

pub mod moderator;
pub mod rewrite_log;

pub use moderator::Moderator;
pub use rewrite_log::RewriteLog;
