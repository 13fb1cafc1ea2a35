//! # Response Mapping Middleware
//!
//! Adds common headers to API responses and logs server errors.
//!
//! Every `/api/v1` response carries `Cache-Control: no-store`.

use axum::{
    extract::Request,
    http::{header::CACHE_CONTROL, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::error;

const API_PREFIX: &str = "/api/v1";

/// Response mapping middleware.
pub async fn map_res(req: Request, next: Next) -> Response {
    let is_api = req.uri().path().starts_with(API_PREFIX);
    let path = req.uri().path().to_string();

    let mut res = next.run(req).await;

    if is_api {
        res.headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    if res.status().is_server_error() {
        error!("[RESPONSE] Server error on {}: {}", path, res.status());
    }

    res
}
