use super::{parse_body, present_str, read_body, require_post};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{comment_key, CommentRecord, GetCommentRequest};
use crate::routes;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};

/// POST /get handler - Fetch a stored comment
///
/// The stored record text is returned verbatim; an unknown key yields an
/// empty 200 body.
#[utoipa::path(
    post,
    path = routes::GET_COMMENT,
    request_body = GetCommentRequest,
    responses(
        (status = 200, description = "Stored comment record, or empty body when absent", body = CommentRecord),
        (status = 400, description = "Missing key", body = ErrorResponse),
        (status = 405, description = "Method other than POST", body = String),
        (status = 500, description = "Malformed body or store error", body = ErrorResponse)
    ),
    tag = "annotations"
)]
pub async fn get_comment_handler(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> Result<Response, ApiError> {
    require_post(&method)?;

    let body = read_body(body, state.config.max_body_bytes).await?;
    let request: GetCommentRequest = parse_body(&body)?;
    let Some(key) = present_str(request.key) else {
        tracing::warn!("get request without key");
        return Err(ApiError::MissingKey);
    };

    match state.store.get(&comment_key(&key)).await? {
        Some(value) => {
            tracing::info!("Successfully retrieved comment with key: {}", key);
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                value,
            )
                .into_response())
        }
        None => {
            tracing::info!("Comment not found with key: {}", key);
            Ok((StatusCode::OK, "").into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::test_util::{
        app_with_store, body_string, failing_app, post_json, send, setup_test_app,
    };
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_missing_comment_is_empty() {
        let (app, _store) = setup_test_app();

        let response = post_json(&app, routes::GET_COMMENT, json!({"key": "unknown"})).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_get_returns_stored_text_verbatim() {
        let (app, store) = setup_test_app();
        let raw = r#"{"time":5,"rater":"erin","value":{"score":4}}"#;
        crate::store::KvStore::put(&store, &comment_key("c9"), raw.to_string())
            .await
            .unwrap();

        let response = post_json(&app, routes::GET_COMMENT, json!({"key": "c9"})).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_string(response).await, raw);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (app, _store) = setup_test_app();

        for body in [json!({}), json!({"key": ""}), json!({"key": null})] {
            let response = post_json(&app, routes::GET_COMMENT, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let error: ErrorResponse =
                serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(error.error, "Missing key");
        }
    }

    #[tokio::test]
    async fn test_get_wrong_method() {
        let (app, _store) = setup_test_app();

        let response = send(&app, "GET", routes::GET_COMMENT, "").await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_get_malformed_body() {
        let (app, _store) = setup_test_app();

        let response = send(&app, "POST", routes::GET_COMMENT, "{\"key\":").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(error.error, "Internal Error");
    }

    #[tokio::test]
    async fn test_get_store_failure() {
        let app = failing_app();

        let response = post_json(&app, routes::GET_COMMENT, json!({"key": "c1"})).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_get_oversized_body() {
        let mut config = Config::in_memory();
        config.max_body_bytes = 64;
        let app = app_with_store(Arc::new(MemoryStore::new()), config);
        let body = json!({"key": "k".repeat(4096)}).to_string();

        let response = send(&app, "PUT", routes::GET_COMMENT, &body).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = send(&app, "POST", routes::GET_COMMENT, &body).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
