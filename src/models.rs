use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

const PROGRESS_TAG: &str = "progress:";
const COMMENT_TAG: &str = "comment:";

/// Request body for POST /upload
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UploadRequest {
    /// Item key, combined with the rater into the record key
    pub key: Option<String>,
    /// Position reached by the rater; any JSON value, `0` included
    #[schema(value_type = Object)]
    pub index: Option<JsonValue>,
    pub rater: Option<String>,
}

/// Response type for successful uploads
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub msg: String,
    #[schema(value_type = Object)]
    pub index: JsonValue,
}

/// Request body for POST /getCompleted
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CompletedRequest {
    /// Rater whose progress keys are listed
    pub key: Option<String>,
    /// Value of the `x-list-cursor` header from the previous page
    pub cursor: Option<String>,
    /// Page size, clamped to the configured maximum. Anything but a
    /// non-negative integer is rejected with 400.
    #[schema(value_type = Option<u32>)]
    pub limit: Option<JsonValue>,
}

/// Request body for POST /get
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GetCommentRequest {
    pub key: Option<String>,
}

/// Request body for POST /put
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PutCommentRequest {
    pub key: Option<String>,
    pub rater: Option<String>,
    #[schema(value_type = Object)]
    pub value: Option<JsonValue>,
}

/// Response type for successful comment writes
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct PutCommentResponse {
    pub msg: String,
    pub key: String,
}

/// Stored marker of the item a rater has reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProgressRecord {
    /// Milliseconds since the Unix epoch, assigned at write time
    pub time: i64,
    #[schema(value_type = Object)]
    pub index: JsonValue,
    pub rater: String,
}

/// Stored comment, returned verbatim by POST /get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommentRecord {
    pub time: i64,
    pub rater: String,
    #[schema(value_type = Object)]
    pub value: JsonValue,
}

/// Store key of a progress record
pub fn progress_key(rater: &str, key: &str) -> String {
    format!("{}{}:{}", PROGRESS_TAG, rater, key)
}

/// Store prefix shared by every progress record of `rater`
pub fn progress_prefix(rater: &str) -> String {
    format!("{}{}:", PROGRESS_TAG, rater)
}

/// Name of a progress key as callers see it, `{rater}:{key}`
pub fn progress_name(store_key: &str) -> &str {
    store_key.strip_prefix(PROGRESS_TAG).unwrap_or(store_key)
}

/// Store key of a comment record
pub fn comment_key(key: &str) -> String {
    format!("{}{}", COMMENT_TAG, key)
}
