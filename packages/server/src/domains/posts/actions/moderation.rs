//! Moderator actions on posts.
//!
//! Each function is one atomic unit of work: guard check, a single
//! conditional write, and a best-effort audit entry. Concurrent moderators
//! racing on the same post resolve through the status guards in the model
//! layer, never through read-modify-write.

use chrono::Utc;
use tracing::info;

use crate::common::utils::richtext::sanitize_rich_text;
use crate::common::utils::text::sanitize_inline;
use crate::common::{PostId, SubmitterId};
use crate::domains::audit;
use crate::domains::posts::actions::{ActionError, ActionResult};
use crate::domains::posts::ai_assist;
use crate::common::utils::text::truncate_chars;
use crate::domains::posts::machines::{
    self, HistorySnapshot, Section, Status, MAX_LOCATION_CHARS, MAX_NOTE_CHARS,
};
use crate::domains::posts::models::{BlockAction, CreatePost, EditContent, Post, Submitter};
use crate::kernel::ServerDeps;

/// Fetch a post or report not-found.
async fn require_post(deps: &ServerDeps, post_id: PostId) -> ActionResult<Post> {
    Post::find_by_id(post_id, &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?
        .ok_or(ActionError::NotFound)
}

/// Approve a pending post, optionally overriding its section.
///
/// Expiry is computed here, once, and never recomputed by later edits.
pub async fn approve(
    deps: &ServerDeps,
    actor: &str,
    post_id: PostId,
    section_override: Option<Section>,
) -> ActionResult<()> {
    let post = require_post(deps, post_id).await?;
    let status = post.status().map_err(ActionError::Internal)?;
    if !machines::can_approve(status) {
        return Err(ActionError::Validation(format!(
            "Cannot approve a {} post",
            status
        )));
    }

    let fields = machines::approval_fields(
        post.section().map_err(ActionError::Internal)?,
        section_override,
        post.event_date,
        Utc::now(),
    );

    // The conditional update decides the race; losing it means another
    // moderator got there first.
    if !Post::approve(post_id, &fields, &deps.db_pool).await? {
        return Err(ActionError::Validation("Post is no longer pending".to_string()));
    }

    info!(post_id = %post_id, section = %fields.section, "Post approved");
    audit::record(actor, "approve", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Reject a pending post. No content change.
pub async fn reject(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    let post = require_post(deps, post_id).await?;
    let status = post.status().map_err(ActionError::Internal)?;
    if !machines::can_reject(status) {
        return Err(ActionError::Validation(format!("Cannot reject a {} post", status)));
    }
    if !Post::transition(post_id, &[Status::Pending], Status::Rejected, &deps.db_pool).await? {
        return Err(ActionError::Validation("Post is no longer pending".to_string()));
    }
    audit::record(actor, "reject", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Moderator edit form fields.
#[derive(Debug, Clone)]
pub struct EditInput {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub section: Option<String>,
}

/// Edit a post's content. Legal from PENDING or LIVE; never changes status.
/// The prior content is pushed onto the undo stack in the same write.
pub async fn edit(
    deps: &ServerDeps,
    actor: &str,
    post_id: PostId,
    input: EditInput,
) -> ActionResult<()> {
    let post = require_post(deps, post_id).await?;
    let status = post.status().map_err(ActionError::Internal)?;
    if !machines::can_edit(status) {
        return Err(ActionError::Validation(format!("Cannot edit a {} post", status)));
    }

    // Length is judged before escaping so an ampersand does not eat into
    // the title budget.
    machines::validate_title(input.title.trim())
        .map_err(|e| ActionError::Validation(e.to_string()))?;
    let title = sanitize_inline(&input.title);

    let coords = machines::validate_coordinates(input.latitude, input.longitude)
        .map_err(|_| ActionError::InvalidCoordinates)?;

    let section = match input.section.as_deref() {
        Some(s) => Some(
            s.parse::<Section>()
                .map_err(|_| ActionError::Validation("Invalid section".to_string()))?,
        ),
        None => None,
    };

    let content = EditContent {
        title,
        description: sanitize_rich_text(&input.description),
        location: input
            .location
            .as_deref()
            .map(sanitize_inline)
            .filter(|s| !s.is_empty())
            .map(|s| truncate_chars(&s, MAX_LOCATION_CHARS)),
        latitude: coords.map(|c| c.latitude),
        longitude: coords.map(|c| c.longitude),
        location_name: input
            .location_name
            .as_deref()
            .map(sanitize_inline)
            .filter(|s| !s.is_empty())
            .map(|s| truncate_chars(&s, MAX_LOCATION_CHARS)),
        section,
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

    if !Post::apply_edit(post_id, &content, &history, now, &deps.db_pool).await? {
        return Err(ActionError::Validation("Post is no longer editable".to_string()));
    }

    audit::record(actor, "edit", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Restore the most recent snapshot from the undo stack.
pub async fn undo(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    let post = require_post(deps, post_id).await?;

    let mut history = post.desc_history.0.clone();
    let snapshot = machines::pop_history(&mut history).ok_or(ActionError::NoUndo)?;

    if !Post::apply_undo(post_id, &snapshot, &history, Utc::now(), &deps.db_pool).await? {
        return Err(ActionError::NotFound);
    }

    audit::record(actor, "undo", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Toggle the pinned flag.
pub async fn toggle_pin(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    if !Post::toggle_pinned(post_id, &deps.db_pool).await? {
        return Err(ActionError::NotFound);
    }
    audit::record(actor, "pin", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Toggle the urgent flag.
pub async fn toggle_urgent(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    if !Post::toggle_urgent(post_id, &deps.db_pool).await? {
        return Err(ActionError::NotFound);
    }
    audit::record(actor, "urgent", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Force a LIVE post to EXPIRED ahead of its computed expiry.
pub async fn expire_now(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    let post = require_post(deps, post_id).await?;
    let status = post.status().map_err(ActionError::Internal)?;
    if !machines::can_expire_now(status) {
        return Err(ActionError::Validation(format!("Cannot expire a {} post", status)));
    }
    if !Post::transition(post_id, &[Status::Live], Status::Expired, &deps.db_pool).await? {
        return Err(ActionError::Validation("Only live posts can be expired".to_string()));
    }
    audit::record(actor, "expire", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Soft-delete from any status.
pub async fn delete(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    require_post(deps, post_id).await?;
    let all = [
        Status::Pending,
        Status::Live,
        Status::Rejected,
        Status::Expired,
    ];
    Post::transition(post_id, &all, Status::Deleted, &deps.db_pool).await?;
    audit::record(actor, "delete", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Bring an archived post back to the PENDING queue.
pub async fn restore(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    let post = require_post(deps, post_id).await?;
    let status = post.status().map_err(ActionError::Internal)?;
    if !machines::can_restore(status) {
        return Err(ActionError::Validation(format!("Cannot restore a {} post", status)));
    }
    let archive = [Status::Rejected, Status::Expired, Status::Deleted];
    if !Post::transition(post_id, &archive, Status::Pending, &deps.db_pool).await? {
        return Err(ActionError::Validation(
            "Only archived posts can be restored".to_string(),
        ));
    }
    audit::record(actor, "restore", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Permanently remove an archived post.
pub async fn purge(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    let post = require_post(deps, post_id).await?;
    let status = post.status().map_err(ActionError::Internal)?;
    if !machines::can_purge(status) {
        return Err(ActionError::Validation(format!("Cannot purge a {} post", status)));
    }
    if !Post::purge(post_id, &deps.db_pool).await? {
        return Err(ActionError::Validation(
            "Only archived posts can be purged".to_string(),
        ));
    }
    audit::record(actor, "purge", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Set or clear the private moderator note.
pub async fn set_mod_note(
    deps: &ServerDeps,
    actor: &str,
    post_id: PostId,
    note: Option<&str>,
) -> ActionResult<()> {
    let note = note
        .map(sanitize_inline)
        .filter(|s| !s.is_empty())
        .map(|s| truncate_chars(&s, MAX_NOTE_CHARS));
    if !Post::set_mod_note(post_id, note.as_deref(), &deps.db_pool).await? {
        return Err(ActionError::NotFound);
    }
    audit::record(actor, "note", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Publish a board note: moderator-authored, straight to LIVE, no queue.
pub async fn publish_board_note(
    deps: &ServerDeps,
    actor: &str,
    title: &str,
    description: &str,
    expires_at: Option<chrono::DateTime<Utc>>,
) -> ActionResult<PostId> {
    let description = sanitize_rich_text(description);
    if title.trim().is_empty() || description.trim().is_empty() {
        return Err(ActionError::NotesEmpty);
    }
    machines::validate_title(title.trim()).map_err(|e| ActionError::Validation(e.to_string()))?;
    let title = sanitize_inline(title);

    let post = Post::create(
        CreatePost::builder()
            .title(title)
            .description(description)
            .section(Section::BoardNotes)
            .status(Some(Status::Live))
            .approved_at(Some(Utc::now()))
            .expires_at(expires_at)
            .mod_post(true)
            .build(),
        &deps.db_pool,
    )
    .await
    .map_err(ActionError::Internal)?;

    info!(post_id = %post.id, "Board note published");
    audit::record(actor, "board_note", Some(post.id), None, &deps.db_pool).await;
    Ok(post.id)
}

/// Re-trigger background analysis. Fire-and-forget; the post is unaffected
/// whether or not the analysis succeeds.
pub async fn reanalyze(deps: &ServerDeps, actor: &str, post_id: PostId) -> ActionResult<()> {
    require_post(deps, post_id).await?;
    ai_assist::dispatch_analysis(deps, post_id);
    audit::record(actor, "reanalyze", Some(post_id), None, &deps.db_pool).await;
    Ok(())
}

/// Submitter details plus their lifetime post count, shown before a
/// moderator decides on a block.
#[derive(Debug, serde::Serialize)]
pub struct SubmitterInfo {
    #[serde(flatten)]
    pub submitter: Submitter,
    pub post_count: i64,
}

/// Look up a submitter and how many posts they have made.
pub async fn submitter_info(
    deps: &ServerDeps,
    submitter_id: SubmitterId,
) -> ActionResult<SubmitterInfo> {
    let submitter = Submitter::find_by_id(submitter_id, &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?
        .ok_or(ActionError::NotFound)?;
    let post_count = Post::count_by_submitter(submitter_id, &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?;
    Ok(SubmitterInfo {
        submitter,
        post_count,
    })
}

/// Block a submitter so their future submissions are auto-rejected or
/// auto-flagged.
pub async fn block_submitter(
    deps: &ServerDeps,
    actor: &str,
    submitter_id: SubmitterId,
    action: BlockAction,
    reason: Option<&str>,
) -> ActionResult<()> {
    if !Submitter::block(submitter_id, action, reason, actor, &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?
    {
        return Err(ActionError::NotFound);
    }
    audit::record(
        actor,
        "block_submitter",
        None,
        Some(&format!("{} {}", submitter_id, action)),
        &deps.db_pool,
    )
    .await;
    Ok(())
}

/// Lift a submitter block.
pub async fn unblock_submitter(
    deps: &ServerDeps,
    actor: &str,
    submitter_id: SubmitterId,
) -> ActionResult<()> {
    if !Submitter::unblock(submitter_id, &deps.db_pool)
        .await
        .map_err(ActionError::Internal)?
    {
        return Err(ActionError::NotFound);
    }
    audit::record(
        actor,
        "unblock_submitter",
        None,
        Some(&submitter_id.to_string()),
        &deps.db_pool,
    )
    .await;
    Ok(())
}
