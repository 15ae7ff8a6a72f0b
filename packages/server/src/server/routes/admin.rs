//! Moderator routes.
//!
//! Form posts from the dashboard redirect back to `/admin` with an error
//! token on failure; the JSON endpoints return structured payloads for the
//! editor widgets.

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::common::{PostId, SubmitterId};
use crate::domains::posts::actions::{
    self,
    moderation::{self, EditInput},
    ActionError, RewriteActor, RewriteMode,
};
use crate::domains::posts::machines::Section;
use crate::domains::posts::models::BlockAction;
use crate::server::app::AppState;
use crate::server::middleware::ModIdentity;
use crate::server::routes::public::parse_form_date;
use crate::server::routes::{error_response, redirect_result};

fn rewrite_actor(identity: &ModIdentity) -> RewriteActor<'_> {
    match identity {
        ModIdentity::SuperAdmin => RewriteActor::SuperAdmin,
        ModIdentity::Moderator(m) => RewriteActor::Moderator(m),
    }
}

/// GET /admin/api/dashboard - queue, live board and archive in one payload.
pub async fn dashboard_handler(Extension(state): Extension<AppState>) -> Response {
    match actions::get_dashboard(&state.deps).await {
        Ok(dashboard) => Json(dashboard).into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ApproveForm {
    /// Optional section override applied at approval time.
    pub section: Option<String>,
}

/// POST /admin/approve/:id
pub async fn approve_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
    Form(form): Form<ApproveForm>,
) -> Response {
    let section = match form.section.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<Section>() {
            Ok(s) => Some(s),
            Err(_) => {
                return redirect_result::<()>(Err(ActionError::Validation(
                    "Invalid section".to_string(),
                )))
            }
        },
        None => None,
    };
    redirect_result(moderation::approve(&state.deps, identity.name(), post_id, section).await)
}

/// POST /admin/reject/:id
pub async fn reject_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::reject(&state.deps, identity.name(), post_id).await)
}

#[derive(Debug, Deserialize)]
pub struct EditForm {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub section: Option<String>,
}

/// POST /admin/edit/:id
pub async fn edit_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
    Form(form): Form<EditForm>,
) -> Response {
    let input = EditInput {
        title: form.title,
        description: form.description,
        location: form.location,
        latitude: form.latitude,
        longitude: form.longitude,
        location_name: form.location_name,
        section: form.section.filter(|s| !s.is_empty()),
    };
    redirect_result(moderation::edit(&state.deps, identity.name(), post_id, input).await)
}

/// POST /admin/undo/:id
pub async fn undo_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::undo(&state.deps, identity.name(), post_id).await)
}

/// POST /admin/pin/:id
pub async fn pin_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::toggle_pin(&state.deps, identity.name(), post_id).await)
}

/// POST /admin/urgent/:id
pub async fn urgent_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::toggle_urgent(&state.deps, identity.name(), post_id).await)
}

/// POST /admin/expire/:id
pub async fn expire_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::expire_now(&state.deps, identity.name(), post_id).await)
}

/// POST /admin/delete/:id
pub async fn delete_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::delete(&state.deps, identity.name(), post_id).await)
}

/// POST /admin/restore/:id
pub async fn restore_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::restore(&state.deps, identity.name(), post_id).await)
}

/// POST /admin/purge/:id
pub async fn purge_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::purge(&state.deps, identity.name(), post_id).await)
}

#[derive(Debug, Deserialize)]
pub struct NoteForm {
    pub note: Option<String>,
}

/// POST /admin/note/:id - set or clear the private moderator note.
pub async fn note_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
    Form(form): Form<NoteForm>,
) -> Response {
    redirect_result(
        moderation::set_mod_note(&state.deps, identity.name(), post_id, form.note.as_deref())
            .await,
    )
}

#[derive(Debug, Deserialize)]
pub struct BoardNoteForm {
    pub title: String,
    pub description: String,
    pub expires_at: Option<String>,
}

/// POST /admin/board-note - publish a moderator notice straight to LIVE.
/// Board notes never auto-expire; an explicit date is the only clock.
pub async fn board_note_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Form(form): Form<BoardNoteForm>,
) -> Response {
    let expires_at = form.expires_at.as_deref().and_then(parse_form_date);
    redirect_result(
        moderation::publish_board_note(
            &state.deps,
            identity.name(),
            &form.title,
            &form.description,
            expires_at,
        )
        .await,
    )
}

/// POST /admin/reanalyze/:id
pub async fn reanalyze_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
) -> Response {
    redirect_result(moderation::reanalyze(&state.deps, identity.name(), post_id).await)
}

#[derive(Debug, Deserialize)]
pub struct RewriteForm {
    /// "suggested", "quick" or "custom".
    pub mode: String,
    pub instructions: Option<String>,
}

/// POST /admin/rewrite/:id - apply an AI rewrite to the post itself.
pub async fn rewrite_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(post_id): Path<PostId>,
    Form(form): Form<RewriteForm>,
) -> Response {
    let mode = match form.mode.as_str() {
        "suggested" => RewriteMode::ApplySuggested,
        "quick" => RewriteMode::Quick,
        "custom" => {
            let instructions = form.instructions.unwrap_or_default();
            if instructions.trim().is_empty() {
                return redirect_result::<()>(Err(ActionError::Validation(
                    "Custom rewrite needs instructions".to_string(),
                )));
            }
            RewriteMode::Custom(instructions)
        }
        _ => {
            return redirect_result::<()>(Err(ActionError::Validation(
                "Unknown rewrite mode".to_string(),
            )))
        }
    };
    redirect_result(actions::rewrite_post(&state.deps, &rewrite_actor(&identity), post_id, mode).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorRewriteRequest {
    pub post_id: Option<PostId>,
    pub content: String,
}

#[derive(Serialize)]
pub struct EditorRewriteResponse {
    pub success: bool,
    pub rewritten: String,
}

/// POST /admin/api/rewrite-editor - rewrite text for the editor without
/// touching any post. Rate-limited when bound to a post.
pub async fn editor_rewrite_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Json(request): Json<EditorRewriteRequest>,
) -> Response {
    match actions::editor_rewrite(
        &state.deps,
        &rewrite_actor(&identity),
        request.post_id,
        &request.content,
    )
    .await
    {
        Ok(rewritten) => Json(EditorRewriteResponse {
            success: true,
            rewritten,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /admin/api/submitter/:id - submitter details and post count.
pub async fn submitter_handler(
    Extension(state): Extension<AppState>,
    Path(submitter_id): Path<SubmitterId>,
) -> Response {
    match moderation::submitter_info(&state.deps, submitter_id).await {
        Ok(info) => Json(info).into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct BlockForm {
    /// "REJECT" or "FLAG".
    pub action: String,
    pub reason: Option<String>,
}

/// POST /admin/block/:submitter_id
pub async fn block_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(submitter_id): Path<SubmitterId>,
    Form(form): Form<BlockForm>,
) -> Response {
    let action = match form.action.parse::<BlockAction>() {
        Ok(a) => a,
        Err(_) => {
            return redirect_result::<()>(Err(ActionError::Validation(
                "Unknown block action".to_string(),
            )))
        }
    };
    redirect_result(
        moderation::block_submitter(
            &state.deps,
            identity.name(),
            submitter_id,
            action,
            form.reason.as_deref().filter(|s| !s.trim().is_empty()),
        )
        .await,
    )
}

/// POST /admin/unblock/:submitter_id
pub async fn unblock_handler(
    Extension(state): Extension<AppState>,
    Extension(identity): Extension<ModIdentity>,
    Path(submitter_id): Path<SubmitterId>,
) -> Response {
    redirect_result(moderation::unblock_submitter(&state.deps, identity.name(), submitter_id).await)
}
