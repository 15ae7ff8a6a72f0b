//! Rewrite rate limiter
//!
//! Pure decision logic over already-fetched counters - NO IO. Two
//! independent caps per moderator: an all-time per-post cap (counted via the
//! post's rewrite counter) and a sliding 60-minute cap (counted via
//! RewriteLog rows). Either breach rejects before the AI provider is ever
//! called.

use serde::Serialize;

use crate::domains::moderators::models::Moderator;

/// Why a rewrite request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RewriteDenied {
    /// The moderator has no rewrite entitlement at all.
    Disabled,
    /// The per-post all-time cap was reached.
    PostCap(i32),
    /// The sliding 60-minute cap was reached.
    HourCap(i32),
}

impl std::fmt::Display for RewriteDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewriteDenied::Disabled => write!(f, "AI rewrite is not enabled for your account"),
            RewriteDenied::PostCap(limit) => write!(
                f,
                "This post has reached its rewrite limit of {}",
                limit
            ),
            RewriteDenied::HourCap(limit) => write!(
                f,
                "You have reached your hourly rewrite limit of {}",
                limit
            ),
        }
    }
}

/// Check a post-bound rewrite against both caps.
///
/// `post_rewrite_count` is the target post's all-time counter;
/// `recent_rewrites` is the moderator's count in the last 60 minutes.
/// The entitlement flag is checked before any limit.
pub fn check_rewrite_allowance(
    moderator: &Moderator,
    post_rewrite_count: i32,
    recent_rewrites: i64,
) -> Result<(), RewriteDenied> {
    if !moderator.rewrite_enabled {
        return Err(RewriteDenied::Disabled);
    }
    if post_rewrite_count >= moderator.rewrite_limit_per_post {
        return Err(RewriteDenied::PostCap(moderator.rewrite_limit_per_post));
    }
    if recent_rewrites >= moderator.rewrite_limit_per_hour as i64 {
        return Err(RewriteDenied::HourCap(moderator.rewrite_limit_per_hour));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::common::ModeratorId;
    use crate::domains::moderators::models::moderator::hash_password;

    fn moderator(enabled: bool, per_post: i32, per_hour: i32) -> Moderator {
        Moderator {
            id: ModeratorId::new(),
            username: "testmod".to_string(),
            password_hash: hash_password("pw"),
            active: true,
            rewrite_enabled: enabled,
            rewrite_limit_per_post: per_post,
            rewrite_limit_per_hour: per_hour,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_disabled_rejected_before_limits() {
        let m = moderator(false, 100, 100);
        assert_eq!(
            check_rewrite_allowance(&m, 0, 0),
            Err(RewriteDenied::Disabled)
        );
    }

    #[test]
    fn test_post_cap_is_all_time() {
        let m = moderator(true, 2, 100);
        assert!(check_rewrite_allowance(&m, 0, 0).is_ok());
        assert!(check_rewrite_allowance(&m, 1, 0).is_ok());
        // Third rewrite of the same post is rejected however old the first
        // two are.
        assert_eq!(
            check_rewrite_allowance(&m, 2, 0),
            Err(RewriteDenied::PostCap(2))
        );
    }

    #[test]
    fn test_hour_cap_counts_all_posts() {
        let m = moderator(true, 100, 5);
        assert!(check_rewrite_allowance(&m, 0, 4).is_ok());
        // Request 6 in the window is rejected even for a fresh post.
        assert_eq!(
            check_rewrite_allowance(&m, 0, 5),
            Err(RewriteDenied::HourCap(5))
        );
    }

    #[test]
    fn test_denial_messages_name_the_cap() {
        assert!(RewriteDenied::PostCap(2).to_string().contains("post"));
        assert!(RewriteDenied::HourCap(5).to_string().contains("hourly"));
    }
}
