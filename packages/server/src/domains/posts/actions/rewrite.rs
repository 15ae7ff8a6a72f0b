//! AI rewrite actions.
//!
//! The rate limiter gates every post-bound rewrite before the provider is
//! called. Rewrites not bound to a post (board-note drafting, the in-editor
//! assist without a post id) are exempt from both caps but still require the
//! entitlement. The super admin bypasses the limiter entirely.

use chrono::Utc;
use tracing::info;

use crate::common::utils::richtext::sanitize_rich_text;
use crate::common::PostId;
use crate::domains::audit;
use crate::domains::moderators::{check_rewrite_allowance, Moderator, RewriteDenied, RewriteLog};
use crate::domains::posts::actions::{ActionError, ActionResult};
use crate::domains::posts::ai_assist::{self, cap_rewrite, RewriteSuggestion};
use crate::domains::posts::machines::{self, HistorySnapshot};
use crate::domains::posts::models::Post;
use crate::kernel::ServerDeps;

/// Who is asking for the rewrite.
#[derive(Debug, Clone)]
pub enum RewriteActor<'a> {
    /// Bypasses the rate limiter entirely.
    SuperAdmin,
    Moderator(&'a Moderator),
}

impl RewriteActor<'_> {
    pub fn name(&self) -> &str {
        match self {
            RewriteActor::SuperAdmin => "super",
            RewriteActor::Moderator(m) => &m.username,
        }
    }
}

/// How the replacement text is produced.
#[derive(Debug, Clone)]
pub enum RewriteMode {
    /// Copy the stored analysis suggestion verbatim (length-capped).
    /// Errors when no analysis exists.
    ApplySuggested,
    /// Call the provider with the default instructions.
    Quick,
    /// Call the provider with moderator-supplied instructions. Deliberately
    /// synchronous: the moderator waits to review the result.
    Custom(String),
}

impl RewriteMode {
    fn audit_name(&self) -> &'static str {
        match self {
            RewriteMode::ApplySuggested => "rewrite_suggested",
            RewriteMode::Quick => "rewrite_quick",
            RewriteMode::Custom(_) => "rewrite_custom",
        }
    }
}

/// Replacement text for an apply-suggested rewrite: the suggestion stored by
/// the last analysis, length-capped. A post that was never analyzed (or
/// whose analysis was discarded) has nothing to apply.
fn suggested_replacement(post: &Post) -> ActionResult<RewriteSuggestion> {
    let analysis = post.ai_analysis.as_ref().ok_or(ActionError::NoRewrite)?;
    Ok(cap_rewrite(analysis.0.rewrite.clone()))
}

async fn enforce_post_limits(
    deps: &ServerDeps,
    actor: &RewriteActor<'_>,
    post: &Post,
) -> ActionResult<()> {
    let RewriteActor::Moderator(moderator) = actor else {
        return Ok(());
    };
    let recent = RewriteLog::count_recent(moderator.id, Utc::now(), &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;
    check_rewrite_allowance(moderator, post.rewrite_count, recent)
        .map_err(ActionError::RateLimited)
}

async fn log_rewrite(deps: &ServerDeps, actor: &RewriteActor<'_>, post_id: PostId) -> ActionResult<()> {
    // Only moderator rewrites count against the rate accounting; the super
    // admin has no log to accumulate.
    if let RewriteActor::Moderator(moderator) = actor {
        RewriteLog::record_and_increment(moderator.id, post_id, &deps.db_pool)
            .await
            .map_err(ActionError::Internal)?;
    }
    Ok(())
}

/// Rewrite a post's title and description.
///
/// Any provider failure aborts before the post is touched: the mutation and
/// the rewrite log only happen once replacement text exists.
pub async fn rewrite_post(
    deps: &ServerDeps,
    actor: &RewriteActor<'_>,
    post_id: PostId,
    mode: RewriteMode,
) -> ActionResult<()> {
    let post = Post::find_by_id(post_id, &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?
        .ok_or(ActionError::NotFound)?;

    let status = post.status().map_err(ActionError::Internal)?;
    if !machines::can_edit(status) {
        return Err(ActionError::Validation(format!(
            "Cannot rewrite a {} post",
            status
        )));
    }

    // Fail fast on limits before spending a provider call.
    enforce_post_limits(deps, actor, &post).await?;

    let replacement = match &mode {
        RewriteMode::ApplySuggested => suggested_replacement(&post)?,
        RewriteMode::Quick => {
            ai_assist::rewrite_text(deps, &post.title, &post.description, None)
                .await
                .ok_or(ActionError::RewriteFailed)?
        }
        RewriteMode::Custom(instructions) => {
            ai_assist::rewrite_text(deps, &post.title, &post.description, Some(instructions))
                .await
                .ok_or(ActionError::RewriteFailed)?
        }
    };

    let now = Utc::now();
    let mut history = post.desc_history.0.clone();
    machines::push_history(
        &mut history,
        HistorySnapshot {
            title: post.title.clone(),
            desc: post.description.clone(),
            timestamp: now,
        },
    );

    let description = sanitize_rich_text(&replacement.desc);
    if !Post::apply_rewrite(post_id, &replacement.title, &description, &history, now, &deps.db_pool)
        .await?
    {
        return Err(ActionError::Validation("Post is no longer editable".to_string()));
    }

    // ApplySuggested consumes no provider call but still counts: the cap is
    // on content churn, not tokens.
    log_rewrite(deps, actor, post_id).await?;

    info!(post_id = %post_id, mode = mode.audit_name(), "Post rewritten");
    audit::record(actor.name(), mode.audit_name(), Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// In-editor rewrite: returns replacement text for the editor without
/// mutating any post. When `post_id` is present the request is rate-limited
/// and logged against that post.
pub async fn editor_rewrite(
    deps: &ServerDeps,
    actor: &RewriteActor<'_>,
    post_id: Option<PostId>,
    content: &str,
) -> ActionResult<String> {
    // Entitlement applies even to unbound rewrites; the caps do not.
    if let RewriteActor::Moderator(moderator) = actor {
        if !moderator.rewrite_enabled {
            return Err(ActionError::RateLimited(RewriteDenied::Disabled));
        }
    }

    let post = match post_id {
        Some(id) => {
            let post = Post::find_by_id(id, &deps.db_pool)
                .await
                .map_err(ActionError::Internal)?
                .ok_or(ActionError::NotFound)?;
            enforce_post_limits(deps, actor, &post).await?;
            Some(post)
        }
        None => None,
    };

    let title = post.as_ref().map(|p| p.title.as_str()).unwrap_or("");
    let RewriteSuggestion { desc, .. } = ai_assist::rewrite_text(deps, title, content, None)
        .await
        .ok_or(ActionError::RewriteFailed)?;

    if let Some(post) = &post {
        log_rewrite(deps, actor, post.id).await?;
    }

    Ok(sanitize_rich_text(&desc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sqlx::types::Json;

    use crate::domains::posts::ai_assist::{
        AnalysisResult, AnalysisUrgency, Recommendation, Sentiment, SuggestedSection,
        REWRITE_DESC_CAP, REWRITE_TITLE_CAP,
    };
    use crate::domains::posts::machines::{Section, Status};

    fn pending_post(analysis: Option<AnalysisResult>) -> Post {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Post {
            id: PostId::new(),
            submitter_id: None,
            title: "Loud party".to_string(),
            description: "<p>Music all night on Oak Ave.</p>".to_string(),
            location: None,
            latitude: None,
            longitude: None,
            location_name: None,
            section: Section::Neighbors.to_string(),
            status: Status::Pending.to_string(),
            event_date: None,
            pinned: false,
            urgent: false,
            mod_note: None,
            mod_post: false,
            ai_analysis: analysis.map(Json),
            rewrite_count: 0,
            desc_history: Json(Vec::new()),
            created_at: now,
            approved_at: None,
            edited_at: None,
            expires_at: None,
        }
    }

    fn analysis_with_rewrite(title: &str, desc: &str) -> AnalysisResult {
        AnalysisResult {
            suggested_section: SuggestedSection::Neighbors,
            urgency: AnalysisUrgency::Low,
            pii_detected: Vec::new(),
            rewrite: RewriteSuggestion {
                title: title.to_string(),
                desc: desc.to_string(),
            },
            sentiment: Sentiment::Concerned,
            recommendation: Recommendation::Approve,
            reasoning: "Neighborly noise complaint.".to_string(),
        }
    }

    #[test]
    fn test_apply_suggested_without_analysis_is_refused() {
        let post = pending_post(None);
        assert!(matches!(
            suggested_replacement(&post),
            Err(ActionError::NoRewrite)
        ));
    }

    #[test]
    fn test_apply_suggested_uses_stored_rewrite() {
        let post = pending_post(Some(analysis_with_rewrite(
            "Noise complaint on Oak Ave",
            "A resident reports loud music overnight.",
        )));
        let replacement = suggested_replacement(&post).unwrap();
        assert_eq!(replacement.title, "Noise complaint on Oak Ave");
        assert_eq!(replacement.desc, "A resident reports loud music overnight.");
    }

    #[test]
    fn test_apply_suggested_caps_oversized_suggestions() {
        let post = pending_post(Some(analysis_with_rewrite(
            &"t".repeat(150),
            &"d".repeat(800),
        )));
        let replacement = suggested_replacement(&post).unwrap();
        assert_eq!(replacement.title.chars().count(), REWRITE_TITLE_CAP);
        assert_eq!(replacement.desc.chars().count(), REWRITE_DESC_CAP);
    }
}
