// HTTP middleware
pub mod auth;

pub use auth::{require_moderator, require_super_admin, ModIdentity};
