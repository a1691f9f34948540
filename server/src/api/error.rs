//! HTTP mapping for [`DeckError`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{DeckError, ErrorKind};

/// Handler error: a [`DeckError`] rendered as `{success:false, error, details?}`.
#[derive(Debug)]
pub struct ApiError(pub DeckError);

impl From<DeckError> for ApiError {
    fn from(err: DeckError) -> Self {
        Self(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(DeckError::Store(err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl ApiError {
    /// Status for the innermost cause.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        status_for(self.0.kind())
    }
}

#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::DirectoryExists => StatusCode::CONFLICT,
        ErrorKind::Configuration => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Transport | ErrorKind::RemoteFailed | ErrorKind::Parse => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }
        let body = ErrorBody {
            success: false,
            error: self.0.to_string(),
            details: self.0.details(),
        };
        (status, Json(body)).into_response()
    }
}
