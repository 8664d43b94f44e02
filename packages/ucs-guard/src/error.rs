//! Rejections produced by the guard middleware.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use ucs_client::{ErrorKind, UcsError};

/// Why a guarded request was not allowed through.
#[derive(Debug, Error)]
pub enum GuardRejection {
    /// The incoming request carried no token for the configured header
    #[error("missing UCS token")]
    MissingToken,

    /// Token or client credential rejected by UCS
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but UCS denied the permission
    #[error("{0}")]
    Forbidden(String),

    /// A handler asked for the UCS identity on a route that is not guarded
    #[error("no UCS identity on this request")]
    MissingIdentity,

    /// UCS accepted the check but sent no user back
    #[error("UCS accepted the request but returned no identity")]
    UnresolvedIdentity,

    /// The client could not complete the check
    #[error(transparent)]
    Ucs(#[from] UcsError),
}

impl GuardRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            GuardRejection::MissingToken | GuardRejection::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GuardRejection::Forbidden(_) => StatusCode::FORBIDDEN,
            GuardRejection::MissingIdentity => StatusCode::INTERNAL_SERVER_ERROR,
            GuardRejection::UnresolvedIdentity => StatusCode::BAD_GATEWAY,
            GuardRejection::Ucs(err) => match err.kind() {
                ErrorKind::Denied => StatusCode::UNAUTHORIZED,
                ErrorKind::Configuration | ErrorKind::UnsupportedMode => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ErrorKind::Transport | ErrorKind::Decode => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            GuardRejection::MissingToken => "missing_token",
            GuardRejection::Unauthorized(_) => "unauthorized",
            GuardRejection::Forbidden(_) => "forbidden",
            GuardRejection::MissingIdentity => "missing_identity",
            GuardRejection::UnresolvedIdentity => "unresolved_identity",
            GuardRejection::Ucs(err) => err.kind().as_str(),
        }
    }
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
