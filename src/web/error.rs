//! JSON error responses for the API routes and downloads.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::actions::ActionError;
use crate::db::DatabaseError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            WebError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentification requise".to_string(),
            ),
            WebError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail),
            WebError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            WebError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            WebError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            WebError::Internal(detail) => {
                tracing::error!(detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Une erreur interne est survenue".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ActionError> for WebError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Forbidden { message, .. } => WebError::Forbidden(message),
            ActionError::Validation(e) => WebError::BadRequest(e.to_string()),
            ActionError::Conflict(msg) => WebError::Conflict(msg),
            ActionError::NotFound(msg) => WebError::NotFound(msg),
            ActionError::Database(e) => e.into(),
        }
    }
}

impl From<DatabaseError> for WebError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => WebError::NotFound("Élément introuvable".into()),
            other => WebError::Internal(other.to_string()),
        }
    }
}
