use super::{now_millis, parse_body, present_str, present_value, read_body, require_post};
use crate::error::ApiError;
use crate::models::{progress_key, ProgressRecord, UploadRequest, UploadResponse};
use crate::routes;
use crate::state::AppState;
use axum::{body::Body, extract::State, http::Method, http::StatusCode, Json};

/// POST /upload handler - Record how far a rater has progressed
///
/// Unreadable or oversized bodies and store failures all answer 400
/// `Bad Request`.
#[utoipa::path(
    post,
    path = routes::UPLOAD,
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Progress saved", body = UploadResponse),
        (status = 400, description = "Missing fields, malformed body or failed write", body = String),
        (status = 405, description = "Method other than POST", body = String)
    ),
    tag = "annotations"
)]
pub async fn upload_handler(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    require_post(&method)?;

    let body = read_body(body, state.config.max_body_bytes)
        .await
        .map_err(ApiError::BadRequest)?;
    let request: UploadRequest =
        parse_body(&body).map_err(|e| ApiError::BadRequest(e.into()))?;
    tracing::debug!(
        "Upload request: key={:?} index={:?} rater={:?}",
        request.key,
        request.index,
        request.rater
    );

    let (Some(key), Some(index), Some(rater)) = (
        present_str(request.key.clone()),
        present_value(request.index.clone()),
        present_str(request.rater.clone()),
    ) else {
        tracing::warn!(
            "Missing fields in upload: key={:?} index={:?} rater={:?}",
            request.key,
            request.index,
            request.rater
        );
        return Err(ApiError::MissingFields);
    };

    let record = ProgressRecord {
        time: now_millis(),
        index: index.clone(),
        rater: rater.clone(),
    };
    let value = serde_json::to_string(&record).map_err(|e| ApiError::BadRequest(e.into()))?;

    let store_key = progress_key(&rater, &key);
    state
        .store
        .put(&store_key, value)
        .await
        .map_err(ApiError::BadRequest)?;

    tracing::info!("Saved progress {} for rater {} on {}", index, rater, key);
    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            msg: "Annotation progress saved".to_string(),
            index,
        }),
    ))
}
