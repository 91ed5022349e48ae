//! CORS policy for the browser annotation client.
//!
//! The allowed origin is a single configured value. It is never reflected
//! from the request, so every response carries the same header set.

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::routes::LIST_CURSOR_HEADER;

const ALLOW_METHODS: &str = "GET, POST, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE: &str = "86400";

/// Placeholder used when a request carries no `Origin` header
pub const ANY_ORIGIN: &str = "*";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origin: HeaderValue,
}

impl CorsPolicy {
    pub fn new(allowed_origin: &str) -> Result<Self> {
        let allowed_origin = HeaderValue::from_str(allowed_origin)
            .with_context(|| format!("Invalid CORS allowed origin: {:?}", allowed_origin))?;
        Ok(Self { allowed_origin })
    }

    /// The CORS header set. `_origin` is accepted so call sites stay the
    /// same once per-origin allow-lists exist.
    pub fn headers(&self, _origin: &str) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(5);
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allowed_origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(LIST_CURSOR_HEADER),
        );
        headers
    }

    /// Merge CORS headers into `response`, overriding any existing values.
    /// Status and body pass through untouched.
    pub fn wrap(&self, mut response: Response, origin: &str) -> Response {
        let response_headers = response.headers_mut();
        for (name, value) in self.headers(origin) {
            if let Some(name) = name {
                response_headers.insert(name, value);
            }
        }
        response
    }

    /// Empty 204 answer to a preflight request
    pub fn preflight(&self, origin: &str) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        *response.headers_mut() = self.headers(origin);
        response
    }
}

pub fn request_origin(headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(ANY_ORIGIN)
        .to_string()
}

/// Outermost layer: answers preflights before routing and wraps every
/// other response, errors included.
pub async fn cors_middleware(
    State(cors): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request_origin(request.headers());

    if request.method() == Method::OPTIONS {
        tracing::debug!("Answering preflight for {} from origin {}", request.uri().path(), origin);
        return cors.preflight(&origin);
    }

    let response = next.run(request).await;
    cors.wrap(response, &origin)
}
