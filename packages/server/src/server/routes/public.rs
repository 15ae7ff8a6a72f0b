//! Public routes: the board itself and the anonymous submission form.

use axum::{
    extract::Extension,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::SubmitterId;
use crate::domains::posts::actions::{self, SubmitInput, SubmitOutcome};
use crate::domains::settings::SiteSettings;
use crate::server::app::AppState;
use crate::server::routes::error_response;

/// Cookie that ties repeat submissions to one anonymous submitter.
pub const SUBMITTER_COOKIE: &str = "vvc_submitter";

/// GET /api/board - the live board grouped by section.
pub async fn board_handler(Extension(state): Extension<AppState>) -> Response {
    match actions::get_board(&state.deps).await {
        Ok(board) => Json(board).into_response(),
        Err(e) => error_response(&e),
    }
}

#[derive(Serialize)]
pub struct SiteInfoResponse {
    pub board_name: String,
    pub tagline: Option<String>,
    pub about_text: Option<String>,
}

/// GET /api/site - public site text. Model configuration stays private.
pub async fn site_info_handler(Extension(state): Extension<AppState>) -> Response {
    match SiteSettings::load(&state.deps.db_pool).await {
        Ok(settings) => Json(SiteInfoResponse {
            board_name: settings.board_name,
            tagline: settings.tagline,
            about_text: settings.about_text,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load site settings");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    pub title: String,
    pub description: String,
    pub section: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub event_date: Option<String>,
    /// Honeypot. Hidden in the form; humans never fill it.
    pub website: Option<String>,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
}

/// Parse a date field from a form. Accepts RFC 3339, the datetime-local
/// format browsers post, or a bare date (taken as noon UTC).
pub fn parse_form_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(12, 0, 0).map(|n| n.and_utc());
    }
    None
}

/// Pull the submitter id out of the Cookie header, if present and valid.
fn submitter_from_cookies(headers: &HeaderMap) -> Option<SubmitterId> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name != SUBMITTER_COOKIE {
            return None;
        }
        value.parse::<SubmitterId>().ok()
    })
}

/// POST /api/submit - anonymous tip submission.
///
/// The response is identical for queued, auto-rejected and honeypot
/// submissions. Only validation failures are reported back.
pub async fn submit_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Form(form): Form<SubmitForm>,
) -> Response {
    let input = SubmitInput {
        title: form.title,
        description: form.description,
        section: form.section,
        location: form.location,
        latitude: form.latitude,
        longitude: form.longitude,
        location_name: form.location_name,
        event_date: form.event_date.as_deref().and_then(parse_form_date),
        website: form.website,
        submitter_id: submitter_from_cookies(&headers),
    };

    match actions::submit_post(&state.deps, input).await {
        Ok(SubmitOutcome::Accepted { submitter_id, .. }) => {
            // A year is plenty; the cookie only links repeat submissions.
            let cookie = format!(
                "{}={}; Path=/; Max-Age=31536000; HttpOnly; SameSite=Lax",
                SUBMITTER_COOKIE, submitter_id
            );
            (
                [(header::SET_COOKIE, cookie)],
                Json(SubmitResponse { status: "ok" }),
            )
                .into_response()
        }
        Ok(SubmitOutcome::SilentlyDropped) => Json(SubmitResponse { status: "ok" }).into_response(),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_form_date_formats() {
        assert!(parse_form_date("2025-09-01T18:00").is_some());
        assert!(parse_form_date("2025-09-01T18:00:00Z").is_some());
        let noon = parse_form_date("2025-09-01").unwrap();
        assert_eq!(noon.hour(), 12);
        assert!(parse_form_date("").is_none());
        assert!(parse_form_date("next tuesday").is_none());
    }

    #[test]
    fn test_submitter_from_cookies() {
        let id = SubmitterId::new();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("other=1; {}={}", SUBMITTER_COOKIE, id).parse().unwrap(),
        );
        assert_eq!(submitter_from_cookies(&headers), Some(id));

        let mut bad = HeaderMap::new();
        bad.insert(header::COOKIE, "vvc_submitter=not-a-uuid".parse().unwrap());
        assert!(submitter_from_cookies(&bad).is_none());
    }
}
