use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const MISSING_FIELDS: &str = "Bad Request: Missing fields";
pub const BAD_REQUEST: &str = "Bad Request";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const NOT_FOUND: &str = "Not Found";
pub const MISSING_KEY: &str = "Missing key";
pub const INTERNAL_ERROR: &str = "Internal Error";

/// Error response type
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Custom error type for API endpoints
///
/// Every variant maps to a fixed status and body. Causes carried by
/// `BadRequest` and `Internal` are logged, never sent to the caller.
#[derive(Debug)]
pub enum ApiError {
    /// Known route called with a method other than POST
    MethodNotAllowed,
    /// A required body field is absent, null or empty
    MissingFields,
    /// Lookup request without a `key`
    MissingKey,
    /// Unreadable body or failed write on the upload route
    BadRequest(anyhow::Error),
    /// No route matches the path
    NotFound,
    /// Anything else: store failures, malformed bodies on the other routes
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED).into_response()
            }
            ApiError::MissingFields => (StatusCode::BAD_REQUEST, MISSING_FIELDS).into_response(),
            ApiError::MissingKey => json_error(StatusCode::BAD_REQUEST, MISSING_KEY),
            ApiError::BadRequest(err) => {
                tracing::warn!("Bad request: {:#}", err);
                (StatusCode::BAD_REQUEST, BAD_REQUEST).into_response()
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND).into_response(),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                internal_error_response()
            }
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    let body = Json(ErrorResponse {
        error: message.to_string(),
    });
    (status, body).into_response()
}

/// The generic 500 body shared by handlers and the panic guard
pub fn internal_error_response() -> Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.into())
    }
}
