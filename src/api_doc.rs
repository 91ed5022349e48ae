use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{
    CommentRecord, CompletedRequest, GetCommentRequest, ProgressRecord, PutCommentRequest,
    PutCommentResponse, UploadRequest, UploadResponse,
};
use crate::store::KeyInfo;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "relook-annotations API",
        version = "0.1.0",
        description = "Annotation progress markers and comments kept in a key-value store"
    ),
    paths(
        handlers::upload::upload_handler,
        handlers::completed::completed_handler,
        handlers::get_comment::get_comment_handler,
        handlers::put_comment::put_comment_handler,
        handlers::health::health_handler
    ),
    components(
        schemas(
            UploadRequest,
            UploadResponse,
            CompletedRequest,
            KeyInfo,
            GetCommentRequest,
            PutCommentRequest,
            PutCommentResponse,
            ProgressRecord,
            CommentRecord,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "annotations", description = "Progress and comment operations"),
        (name = "health", description = "Health check operations")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            crate::routes::UPLOAD,
            crate::routes::GET_COMPLETED,
            crate::routes::GET_COMMENT,
            crate::routes::PUT_COMMENT,
            crate::routes::HEALTH,
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
