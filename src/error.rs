//! API error taxonomy.
//!
//! Every failure leaving a handler or a gate is an [`ApiError`]. The variant
//! decides the HTTP status and the stable machine-readable code; the message
//! is the human-readable part. Unexpected failures are logged here and reach
//! the client only as a generic `SERVER_ERROR`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::user_store::StoreError;

/// Why the access gate turned a request away.
///
/// All of these map to `AUTH_REQUIRED`; only the message differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    Expired,
    Invalid,
    RefreshExpired,
    RefreshInvalid,
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "Access token is required",
            AuthFailure::Expired => "Access token has expired",
            AuthFailure::Invalid => "Invalid access token",
            AuthFailure::RefreshExpired => "Refresh token has expired",
            AuthFailure::RefreshInvalid => "Invalid refresh token",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    DuplicateEntry(String),
    #[error("{0}")]
    ResourceNotFound(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{}", .0.message())]
    AuthRequired(AuthFailure),
    #[error("You do not have permission to access this resource")]
    Forbidden,
    #[error("Invalid input parameters")]
    InvalidInput(Vec<String>),
    #[error("Internal server error")]
    Server(#[from] anyhow::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEntry(_) => StatusCode::CONFLICT,
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials | ApiError::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            ApiError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::AuthRequired(_) => "AUTH_REQUIRED",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Server(_) => "SERVER_ERROR",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let description = match self {
            ApiError::InvalidInput(problems) if !problems.is_empty() => Some(problems.join("; ")),
            _ => None,
        };

        ErrorBody {
            status: self.status().as_u16(),
            code: self.code(),
            message: self.to_string(),
            description,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => {
                ApiError::DuplicateEntry(format!("A record with this {what} already exists"))
            }
            StoreError::NotFound => ApiError::ResourceNotFound("Resource not found".to_string()),
            StoreError::Backend(e) => ApiError::Server(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(vec![rejection.body_text()])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Server(ref e) = self {
            error!("Request failed: {:#}", e);
        }

        (self.status(), Json(self.body())).into_response()
    }
}
