// HTTP routes
pub mod admin;
pub mod health;
pub mod public;
pub mod superadmin;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::domains::moderators::RewriteDenied;
use crate::domains::posts::actions::ActionError;

pub use health::health_handler;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

fn status_for(error: &ActionError) -> StatusCode {
    match error {
        ActionError::NotFound => StatusCode::NOT_FOUND,
        ActionError::RateLimited(RewriteDenied::Disabled) => StatusCode::FORBIDDEN,
        ActionError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        ActionError::RewriteFailed | ActionError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

/// JSON error payload with the stable token plus a human message.
pub fn error_response(error: &ActionError) -> Response {
    if matches!(error, ActionError::Internal(_)) {
        tracing::error!(error = %error, "Action failed");
    }
    (
        status_for(error),
        Json(ErrorBody {
            error: error.code(),
            message: error.to_string(),
        }),
    )
        .into_response()
}

/// Form-post verbs land back on the dashboard; failures carry the error
/// token in the query string for the UI to surface.
pub fn redirect_result<T>(result: Result<T, ActionError>) -> Response {
    match result {
        Ok(_) => Redirect::to("/admin").into_response(),
        Err(e) => {
            if matches!(e, ActionError::Internal(_)) {
                tracing::error!(error = %e, "Moderation action failed");
            }
            Redirect::to(&format!("/admin?error={}", e.code())).into_response()
        }
    }
}
