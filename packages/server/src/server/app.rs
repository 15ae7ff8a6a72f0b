//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use openrouter_client::OpenRouterClient;
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::{BaseAI, OpenRouterAI, ServerDeps, TokioSpawner};
use crate::server::middleware::{require_moderator, require_super_admin};
use crate::server::routes::{admin, health_handler, public, superadmin};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
    pub config: Arc<Config>,
}

/// Build the AI client from configuration. A missing API key means the board
/// runs without pre-screening, not that startup fails.
fn build_ai(config: &Config) -> Option<Arc<dyn BaseAI>> {
    let api_key = config.openrouter_api_key.clone()?;
    let mut client = OpenRouterClient::new(api_key).with_app_title("Neighborhood Board");
    if let Some(site_url) = &config.site_url {
        client = client.with_referer(site_url.clone());
    }
    Some(Arc::new(OpenRouterAI::new(Arc::new(client))))
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, config: Config) -> Router {
    let ai = build_ai(&config);
    if ai.is_none() {
        tracing::warn!("OPENROUTER_API_KEY not set; AI pre-screening is disabled");
    }
    if config.super_admin_pass.is_none() {
        tracing::warn!("SUPER_ADMIN_PASS not set; super admin login is disabled");
    }

    let deps = ServerDeps::new(pool, ai, Arc::new(TokioSpawner));
    let app_state = AppState {
        deps,
        config: Arc::new(config),
    };

    // CORS configuration - the board is public read, so origins stay open
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // Rate limiting on the public submission form only: 1 req/sec per IP
    // with a small burst. Reads and authenticated routes are unthrottled.
    let submit_rate_limit = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(1)
            .burst_size(5)
            .use_headers() // Extract IP from X-Forwarded-For header
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );

    let public_routes = Router::new()
        .route("/api/board", get(public::board_handler))
        .route("/api/site", get(public::site_info_handler))
        .route(
            "/api/submit",
            post(public::submit_handler).layer(GovernorLayer {
                config: submit_rate_limit,
            }),
        );

    let admin_routes = Router::new()
        .route("/admin/api/dashboard", get(admin::dashboard_handler))
        .route("/admin/api/rewrite-editor", post(admin::editor_rewrite_handler))
        .route("/admin/api/submitter/:id", get(admin::submitter_handler))
        .route("/admin/approve/:id", post(admin::approve_handler))
        .route("/admin/reject/:id", post(admin::reject_handler))
        .route("/admin/edit/:id", post(admin::edit_handler))
        .route("/admin/undo/:id", post(admin::undo_handler))
        .route("/admin/pin/:id", post(admin::pin_handler))
        .route("/admin/urgent/:id", post(admin::urgent_handler))
        .route("/admin/expire/:id", post(admin::expire_handler))
        .route("/admin/delete/:id", post(admin::delete_handler))
        .route("/admin/restore/:id", post(admin::restore_handler))
        .route("/admin/purge/:id", post(admin::purge_handler))
        .route("/admin/note/:id", post(admin::note_handler))
        .route("/admin/board-note", post(admin::board_note_handler))
        .route("/admin/reanalyze/:id", post(admin::reanalyze_handler))
        .route("/admin/rewrite/:id", post(admin::rewrite_handler))
        .route("/admin/block/:submitter_id", post(admin::block_handler))
        .route("/admin/unblock/:submitter_id", post(admin::unblock_handler))
        .route_layer(middleware::from_fn(require_moderator));

    let super_routes = Router::new()
        .route(
            "/super/api/moderators",
            get(superadmin::list_moderators_handler).post(superadmin::create_moderator_handler),
        )
        .route(
            "/super/api/moderators/:id/password",
            post(superadmin::set_password_handler),
        )
        .route(
            "/super/api/moderators/:id/active",
            post(superadmin::set_active_handler),
        )
        .route(
            "/super/api/moderators/:id/rewrite",
            post(superadmin::set_rewrite_entitlement_handler),
        )
        .route(
            "/super/api/settings",
            get(superadmin::get_settings_handler),
        )
        .route(
            "/super/api/settings/site",
            post(superadmin::update_site_settings_handler),
        )
        .route(
            "/super/api/settings/llm",
            post(superadmin::update_llm_settings_handler),
        )
        .route("/super/api/ping", post(superadmin::ping_model_handler))
        .route("/super/api/audit", get(superadmin::audit_log_handler))
        .route_layer(middleware::from_fn(require_super_admin));

    public_routes
        .merge(admin_routes)
        .merge(super_routes)
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
