//! Super admin routes: moderator accounts, LLM configuration, site text
//! and the audit trail. All JSON; the console is a thin client.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::ModeratorId;
use crate::domains::audit::AuditEntry;
use crate::domains::moderators::Moderator;
use crate::domains::settings::{SiteSettings, AVAILABLE_MODELS};
use crate::server::app::AppState;

const AUDIT_PAGE_SIZE: i64 = 200;

#[derive(Serialize)]
struct ApiError {
    error: String,
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!(error = %e, "Super admin request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: "server_error".to_string(),
        }),
    )
        .into_response()
}

// =============================================================================
// Moderator accounts
// =============================================================================

/// GET /super/api/moderators
pub async fn list_moderators_handler(Extension(state): Extension<AppState>) -> Response {
    match Moderator::list_all(&state.deps.db_pool).await {
        Ok(moderators) => Json(moderators).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateModeratorRequest {
    pub username: String,
    pub password: String,
}

/// POST /super/api/moderators
pub async fn create_moderator_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<CreateModeratorRequest>,
) -> Response {
    if request.password.len() < 8 {
        return bad_request("Password must be at least 8 characters");
    }
    match Moderator::create(&request.username, &request.password, &state.deps.db_pool).await {
        Ok(moderator) => (StatusCode::CREATED, Json(moderator)).into_response(),
        // Duplicate usernames and validation failures both land here; the
        // message is already user-facing.
        Err(e) => bad_request(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

/// POST /super/api/moderators/:id/password
pub async fn set_password_handler(
    Extension(state): Extension<AppState>,
    Path(moderator_id): Path<ModeratorId>,
    Json(request): Json<SetPasswordRequest>,
) -> Response {
    if request.password.len() < 8 {
        return bad_request("Password must be at least 8 characters");
    }
    match Moderator::set_password(moderator_id, &request.password, &state.deps.db_pool).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// POST /super/api/moderators/:id/active
pub async fn set_active_handler(
    Extension(state): Extension<AppState>,
    Path(moderator_id): Path<ModeratorId>,
    Json(request): Json<SetActiveRequest>,
) -> Response {
    match Moderator::set_active(moderator_id, request.active, &state.deps.db_pool).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct RewriteEntitlementRequest {
    pub enabled: bool,
    pub limit_per_post: i32,
    pub limit_per_hour: i32,
}

/// POST /super/api/moderators/:id/rewrite - per-moderator AI allowance.
pub async fn set_rewrite_entitlement_handler(
    Extension(state): Extension<AppState>,
    Path(moderator_id): Path<ModeratorId>,
    Json(request): Json<RewriteEntitlementRequest>,
) -> Response {
    if request.limit_per_post < 0 || request.limit_per_hour < 0 {
        return bad_request("Limits must be non-negative");
    }
    match Moderator::set_rewrite_entitlement(
        moderator_id,
        request.enabled,
        request.limit_per_post,
        request.limit_per_hour,
        &state.deps.db_pool,
    )
    .await
    {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Serialize)]
pub struct SettingsResponse {
    pub settings: SiteSettings,
    pub available_models: &'static [&'static str],
    pub ai_configured: bool,
}

/// GET /super/api/settings
pub async fn get_settings_handler(Extension(state): Extension<AppState>) -> Response {
    match SiteSettings::load(&state.deps.db_pool).await {
        Ok(settings) => Json(SettingsResponse {
            settings,
            available_models: AVAILABLE_MODELS,
            ai_configured: state.deps.ai.is_some(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SiteSettingsRequest {
    pub board_name: String,
    pub tagline: Option<String>,
    pub about_text: Option<String>,
}

/// POST /super/api/settings/site
pub async fn update_site_settings_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<SiteSettingsRequest>,
) -> Response {
    let board_name = request.board_name.trim();
    if board_name.is_empty() {
        return bad_request("Board name is required");
    }
    match SiteSettings::update_site(
        board_name,
        request.tagline.as_deref(),
        request.about_text.as_deref(),
        &state.deps.db_pool,
    )
    .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmSettingsRequest {
    pub analysis_model: String,
    pub rewrite_model: String,
    pub rewrite_prompt: Option<String>,
}

/// POST /super/api/settings/llm
pub async fn update_llm_settings_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<LlmSettingsRequest>,
) -> Response {
    match SiteSettings::update_llm(
        &request.analysis_model,
        &request.rewrite_model,
        request
            .rewrite_prompt
            .as_deref()
            .filter(|s| !s.trim().is_empty()),
        &state.deps.db_pool,
    )
    .await
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        // update_llm rejects unknown model ids
        Err(e) => bad_request(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct PingRequest {
    pub model: String,
}

#[derive(Serialize)]
pub struct PingResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /super/api/ping - round-trip the provider with the chosen model.
pub async fn ping_model_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<PingRequest>,
) -> Response {
    if !AVAILABLE_MODELS.contains(&request.model.as_str()) {
        return bad_request(format!("Unknown model: {}", request.model));
    }
    let Some(ai) = &state.deps.ai else {
        return Json(PingResponse {
            ok: false,
            error: Some("AI is not configured".to_string()),
        })
        .into_response();
    };
    match ai.ping(&request.model).await {
        Ok(()) => Json(PingResponse {
            ok: true,
            error: None,
        })
        .into_response(),
        Err(e) => Json(PingResponse {
            ok: false,
            error: Some(e.to_string()),
        })
        .into_response(),
    }
}

// =============================================================================
// Audit trail
// =============================================================================

/// GET /super/api/audit - most recent moderation actions.
pub async fn audit_log_handler(Extension(state): Extension<AppState>) -> Response {
    match AuditEntry::list_recent(AUDIT_PAGE_SIZE, &state.deps.db_pool).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => internal_error(e),
    }
}
