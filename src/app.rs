use std::any::Any;

use axum::{
    middleware,
    response::Response,
    routing::{any, get},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::cors::{cors_middleware, CorsPolicy};
use crate::error::{internal_error_response, ApiError};
use crate::handlers;
use crate::routes;
use crate::state::AppState;

/// Build the request dispatcher.
///
/// Layers, outermost first: CORS (preflight short-circuit and header merge),
/// request tracing, panic guard. The annotation routes accept any method so
/// their handlers can answer 405 themselves.
pub fn router(state: AppState, cors: CorsPolicy) -> Router {
    Router::new()
        .route(routes::UPLOAD, any(handlers::upload_handler))
        .route(routes::GET_COMPLETED, any(handlers::completed_handler))
        .route(routes::GET_COMMENT, any(handlers::get_comment_handler))
        .route(routes::PUT_COMMENT, any(handlers::put_comment_handler))
        .route(routes::HEALTH, get(handlers::health_handler))
        .merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(cors, cors_middleware))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!("Handler panicked: {}", detail);
    internal_error_response()
}
