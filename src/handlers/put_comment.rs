use super::{now_millis, parse_body, present_str, present_value, read_body, require_post};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{comment_key, CommentRecord, PutCommentRequest, PutCommentResponse};
use crate::routes;
use crate::state::AppState;
use axum::{body::Body, extract::State, http::Method, http::StatusCode, Json};

/// POST /put handler - Store a comment, replacing any previous one
#[utoipa::path(
    post,
    path = routes::PUT_COMMENT,
    request_body = PutCommentRequest,
    responses(
        (status = 200, description = "Comment saved", body = PutCommentResponse),
        (status = 400, description = "Missing fields", body = String),
        (status = 405, description = "Method other than POST", body = String),
        (status = 500, description = "Malformed body or store error", body = ErrorResponse)
    ),
    tag = "annotations"
)]
pub async fn put_comment_handler(
    State(state): State<AppState>,
    method: Method,
    body: Body,
) -> Result<(StatusCode, Json<PutCommentResponse>), ApiError> {
    require_post(&method)?;

    let body = read_body(body, state.config.max_body_bytes).await?;
    let request: PutCommentRequest = parse_body(&body)?;
    let (Some(key), Some(rater), Some(value)) = (
        present_str(request.key.clone()),
        present_str(request.rater.clone()),
        present_value(request.value.clone()),
    ) else {
        tracing::warn!(
            "Missing fields in put: key={:?} rater={:?} value={:?}",
            request.key,
            request.rater,
            request.value
        );
        return Err(ApiError::MissingFields);
    };

    // Rater is an attribute only; the comment key is not namespaced by it
    let record = CommentRecord {
        time: now_millis(),
        rater,
        value,
    };
    state
        .store
        .put(&comment_key(&key), serde_json::to_string(&record)?)
        .await?;

    tracing::info!("Successfully stored comment with key: {}", key);
    Ok((
        StatusCode::OK,
        Json(PutCommentResponse {
            msg: "Annotation saved".to_string(),
            key,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::test_util::{
        app_with_store, body_string, failing_app, post_json, send, setup_test_app,
    };
    use crate::store::{KvStore, MemoryStore};
    use std::sync::Arc;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_then_get() {
        let (app, _store) = setup_test_app();

        let response = post_json(
            &app,
            routes::PUT_COMMENT,
            json!({"key": "c1", "rater": "alice", "value": "looks good"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&body_string(response).await).unwrap(),
            json!({"msg": "Annotation saved", "key": "c1"})
        );

        let response = post_json(&app, routes::GET_COMMENT, json!({"key": "c1"})).await;
        assert_eq!(response.status(), StatusCode::OK);
        let record: CommentRecord = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(record.rater, "alice");
        assert_eq!(record.value, json!("looks good"));
        assert!(record.time > 0);
    }

    #[tokio::test]
    async fn test_second_put_wins() {
        let (app, _store) = setup_test_app();

        for (rater, value) in [("alice", json!({"score": 1})), ("bob", json!({"score": 2}))] {
            let response = post_json(
                &app,
                routes::PUT_COMMENT,
                json!({"key": "c2", "rater": rater, "value": value}),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = post_json(&app, routes::GET_COMMENT, json!({"key": "c2"})).await;
        let record: CommentRecord = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(record.rater, "bob");
        assert_eq!(record.value, json!({"score": 2}));
    }

    #[tokio::test]
    async fn test_repeated_put_only_changes_time() {
        let (app, store) = setup_test_app();
        let payload = json!({"key": "c5", "rater": "alice", "value": {"score": 3}});

        let mut records = Vec::new();
        for _ in 0..2 {
            let response = post_json(&app, routes::PUT_COMMENT, payload.clone()).await;
            assert_eq!(response.status(), StatusCode::OK);
            let stored = store.get(&comment_key("c5")).await.unwrap().unwrap();
            records.push(serde_json::from_str::<CommentRecord>(&stored).unwrap());
        }

        assert_eq!(records[1].rater, records[0].rater);
        assert_eq!(records[1].value, records[0].value);
        assert!(records[1].time >= records[0].time);
    }

    #[tokio::test]
    async fn test_put_false_value_is_present() {
        let (app, _store) = setup_test_app();

        let response = post_json(
            &app,
            routes::PUT_COMMENT,
            json!({"key": "c3", "rater": "alice", "value": false}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_put_missing_fields() {
        let (app, store) = setup_test_app();

        for body in [
            json!({"key": "c4", "rater": "alice"}),
            json!({"key": "c4", "value": "x"}),
            json!({"rater": "alice", "value": "x"}),
            json!({"key": "c4", "rater": "alice", "value": ""}),
        ] {
            let response = post_json(&app, routes::PUT_COMMENT, body).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_string(response).await, "Bad Request: Missing fields");
        }

        let stored = store.get(&comment_key("c4")).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_put_wrong_method() {
        let (app, _store) = setup_test_app();

        let response = send(
            &app,
            "DELETE",
            routes::PUT_COMMENT,
            r#"{"key":"c1","rater":"alice","value":"x"}"#,
        )
        .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_put_store_failure() {
        let app = failing_app();

        let response = post_json(
            &app,
            routes::PUT_COMMENT,
            json!({"key": "c1", "rater": "alice", "value": "x"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(error.error, "Internal Error");
    }

    #[tokio::test]
    async fn test_put_oversized_body() {
        let store = MemoryStore::new();
        let mut config = Config::in_memory();
        config.max_body_bytes = 64;
        let app = app_with_store(Arc::new(store.clone()), config);

        let response = send(&app, "GET", routes::PUT_COMMENT, &"x".repeat(4096)).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = post_json(
            &app,
            routes::PUT_COMMENT,
            json!({"key": "c6", "rater": "alice", "value": "x".repeat(4096)}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(error.error, "Internal Error");
        assert!(store.get(&comment_key("c6")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_accepts_body_past_framework_default() {
        let (app, store) = setup_test_app();
        let value = "x".repeat(3 << 20);

        let response = post_json(
            &app,
            routes::PUT_COMMENT,
            json!({"key": "c7", "rater": "alice", "value": value}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let stored = store.get(&comment_key("c7")).await.unwrap().unwrap();
        let record: CommentRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(record.value, json!(value));
    }
}
