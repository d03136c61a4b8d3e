//! Request-scoped error taxonomy and its HTTP rendering.
//!
//! Every failure surfaces as `{statusCode, timestamp, path, message,
//! errorDetails}`. The `path` is filled in by [`attach_request_path`], which
//! runs around the whole router.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::validation::FieldError;
use crate::repositories::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(message) => AppError::Conflict(message),
            StoreError::Backend(message) => AppError::Internal(message),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, error_details) = match self {
            AppError::Internal(source) => {
                tracing::error!(error = %source, "unhandled internal error");
                ("Internal server error".to_string(), None)
            }
            AppError::Validation(fields) => {
                let details = json!({ "fields": fields });
                ("Validation failed".to_string(), Some(details))
            }
            other => {
                let message = other.to_string();
                let details = json!({ "error": status.canonical_reason(), "message": message });
                (message, Some(details))
            }
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: String::new(),
            message,
            error_details,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Rewrites error bodies produced by [`AppError`] so they carry the request path.
pub async fn attach_request_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    match response.extensions().get::<ErrorBody>().cloned() {
        Some(mut body) => {
            let status = response.status();
            body.path = path;
            let mut rewritten = (status, Json(body.clone())).into_response();
            rewritten.extensions_mut().insert(body);
            rewritten
        }
        None => response,
    }
}
