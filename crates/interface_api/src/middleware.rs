//! API middleware

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

use core_kernel::RequestId;

/// Header carrying the per-request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Audit logging middleware
///
/// Tags every request with a [`RequestId`], logs method, URI, status and
/// duration, and echoes the id back in the `x-request-id` header.
pub async fn audit_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = RequestId::new();
    let method = request.method().clone();
    let uri = request.uri().clone();
    request.extensions_mut().insert(request_id);

    let start = Instant::now();
    let mut response = next.run(request).await;
    let status = response.status();

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "API request"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
