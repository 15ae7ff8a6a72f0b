//! Moderators domain - accounts, entitlements and rewrite rate limiting.

pub mod models;
pub mod rate_limit;

pub use models::{Moderator, RewriteLog};
pub use rate_limit::{check_rewrite_allowance, RewriteDenied};
