use super::{parse_body, present_str, read_body, require_post};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{progress_name, progress_prefix, CompletedRequest};
use crate::routes;
use crate::state::AppState;
use crate::store::{KeyInfo, ListOptions};
use anyhow::Context;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value as JsonValue;

/// Cursors travel hex-encoded so any key survives as a header value
fn encode_cursor(store_key: &str) -> String {
    hex::encode(store_key)
}

fn decode_cursor(cursor: &str) -> anyhow::Result<String> {
    let bytes = hex::decode(cursor).context("List cursor is not valid hex")?;
    String::from_utf8(bytes).context("List cursor is not valid UTF-8")
}

/// Page size requested by the client, clamped to `1..=max`
fn page_limit(limit: Option<&JsonValue>, max: usize) -> anyhow::Result<usize> {
    let Some(value) = limit else {
        return Ok(max);
    };
    let requested = value
        .as_u64()
        .with_context(|| format!("List limit must be a non-negative integer, got {}", value))?;
    Ok(usize::try_from(requested).unwrap_or(max).clamp(1, max))
}

/// POST /getCompleted handler - List the progress keys of a rater
///
/// Answers a JSON array of `{"name": "{rater}:{key}"}` objects in key order.
/// When more keys remain, the `x-list-cursor` response header carries the
/// token to send back as `cursor` for the next page.
#[utoipa::path(
    post,
    path = routes::GET_COMPLETED,
    request_body = CompletedRequest,
    responses(
        (status = 200, description = "Progress keys of the rater", body = Vec<KeyInfo>,
            headers(("x-list-cursor" = String, description = "Cursor of the next page, absent on the last page"))),
        (status = 400, description = "Missing key, invalid cursor or invalid limit", body = ErrorResponse),
        (status = 405, description = "Method other than POST", body = String),
        (status = 500, description = "Malformed body or store error", body = ErrorResponse)
    ),
    tag = "annotations"
)]
pub async fn completed_handler(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> Result<Response, ApiError> {
    require_post(&method)?;

    let body = read_body(body, state.config.max_body_bytes).await?;
    let request: CompletedRequest = parse_body(&body)?;
    let Some(rater) = present_str(request.key) else {
        tracing::warn!("getCompleted request without key");
        return Err(ApiError::MissingKey);
    };

    let cursor = request
        .cursor
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(decode_cursor)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let limit = page_limit(request.limit.as_ref(), state.config.list_page_limit)
        .map_err(ApiError::BadRequest)?;

    let prefix = progress_prefix(&rater);
    let listing = state
        .store
        .list(ListOptions {
            prefix: &prefix,
            cursor: cursor.as_deref(),
            limit,
        })
        .await?;

    tracing::info!(
        "Listed {} completed keys for rater {} (complete: {})",
        listing.keys.len(),
        rater,
        listing.list_complete()
    );

    let keys: Vec<KeyInfo> = listing
        .keys
        .iter()
        .map(|k| KeyInfo {
            name: progress_name(&k.name).to_string(),
        })
        .collect();

    let mut response = (StatusCode::OK, Json(keys)).into_response();
    if let Some(next) = listing.cursor {
        let value = HeaderValue::from_str(&encode_cursor(&next))
            .context("Encoded list cursor is not a valid header value")?;
        response.headers_mut().insert(routes::LIST_CURSOR_HEADER, value);
    }
    Ok(response)
}
