//! Moderator authentication middleware (HTTP Basic).
//!
//! Two identities come out of the same header: the configured super admin
//! (credentials from environment, no database row) and regular moderator
//! accounts. Handlers read the resolved `ModIdentity` from request
//! extensions.

use axum::{
    extract::{Extension, Request},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine as _;

use crate::domains::moderators::Moderator;
use crate::server::app::AppState;

/// Resolved identity for an authenticated moderation request.
#[derive(Debug, Clone)]
pub enum ModIdentity {
    /// Site owner. Bypasses the rewrite rate limiter and manages accounts.
    SuperAdmin,
    Moderator(Moderator),
}

impl ModIdentity {
    /// Actor name for audit entries.
    pub fn name(&self) -> &str {
        match self {
            ModIdentity::SuperAdmin => "super",
            ModIdentity::Moderator(m) => &m.username,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, ModIdentity::SuperAdmin)
    }
}

/// Parse an `Authorization: Basic ...` header into (username, password).
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"moderation\"")],
        "Authentication required",
    )
        .into_response()
}

async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Option<ModIdentity> {
    let header_value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (username, password) = parse_basic_auth(header_value)?;

    // Super admin is configured, not stored; an unset password disables it.
    if let Some(super_pass) = &state.config.super_admin_pass {
        if username == state.config.super_admin_user && &password == super_pass {
            return Some(ModIdentity::SuperAdmin);
        }
    }

    match Moderator::authenticate(&username, &password, &state.deps.db_pool).await {
        Ok(Some(moderator)) => Some(ModIdentity::Moderator(moderator)),
        Ok(None) => None,
        Err(e) => {
            tracing::error!(error = %e, "Moderator lookup failed during auth");
            None
        }
    }
}

/// Require any authenticated moderator (or the super admin).
pub async fn require_moderator(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_identity(&state, request.headers()).await {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => unauthorized(),
    }
}

/// Require the super admin specifically.
pub async fn require_super_admin(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_identity(&state, request.headers()).await {
        Some(identity) if identity.is_super_admin() => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        _ => unauthorized(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_auth() {
        // "mod:secret"
        let header = "Basic bW9kOnNlY3JldA==";
        let (user, pass) = parse_basic_auth(header).unwrap();
        assert_eq!(user, "mod");
        assert_eq!(pass, "secret");
    }

    #[test]
    fn test_parse_basic_auth_password_with_colon() {
        // "mod:se:cret" - only the first colon splits
        let encoded = base64::engine::general_purpose::STANDARD.encode("mod:se:cret");
        let (user, pass) = parse_basic_auth(&format!("Basic {}", encoded)).unwrap();
        assert_eq!(user, "mod");
        assert_eq!(pass, "se:cret");
    }

    #[test]
    fn test_parse_basic_auth_rejects_other_schemes() {
        assert!(parse_basic_auth("Bearer abc123").is_none());
        assert!(parse_basic_auth("Basic not-base64!!!").is_none());
    }
}
