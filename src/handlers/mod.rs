pub mod completed;
pub mod get_comment;
pub mod health;
pub mod put_comment;
pub mod upload;

pub use completed::completed_handler;
pub use get_comment::get_comment_handler;
pub use health::health_handler;
pub use put_comment::put_comment_handler;
pub use upload::upload_handler;

use anyhow::Context;
use axum::{
    body::{Body, Bytes},
    http::Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::ApiError;

/// The annotation routes only accept POST; checked before the body is read.
fn require_post(method: &Method) -> Result<(), ApiError> {
    if *method == Method::POST {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed)
    }
}

/// Buffer the raw request body, failing once it exceeds `limit` bytes.
///
/// Handlers take the unread `Body` so the method check runs first and the
/// configured limit replaces the framework default.
async fn read_body(body: Body, limit: usize) -> anyhow::Result<Bytes> {
    axum::body::to_bytes(body, limit)
        .await
        .context("Failed to read request body")
}

/// Decode a JSON request body. No content-type is required.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(body)
}

/// A string field counts as present when it is non-empty
fn present_str(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

/// A JSON field counts as present unless null or the empty string; `0` and
/// `false` are accepted.
fn present_value(field: Option<JsonValue>) -> Option<JsonValue> {
    field.filter(|v| !matches!(v, JsonValue::Null) && v.as_str() != Some(""))
}

/// Server-assigned record timestamp in milliseconds since the Unix epoch
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
