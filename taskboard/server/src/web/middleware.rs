use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::web::api::{ApiError, INVALID_JSON_FORMAT};

/// Largest request body the API will buffer, matching axum's default `Json` limit.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Rejects a POST or PUT whose JSON body does not parse, before any handler
/// runs. Routes that ignore their body are covered too.
///
/// Only bodies declared as JSON are inspected, and the top level must be an
/// object or an array. Bodies with any other content type pass through.
pub async fn reject_malformed_json(request: Request, next: Next) -> Response {
    if !matches!(*request.method(), Method::POST | Method::PUT)
        || !has_json_content_type(request.headers())
    {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!("Failed to buffer request body: {}", err);
            return ApiError::bad_request(INVALID_JSON_FORMAT).into_response();
        }
    };

    if !bytes.is_empty() {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(_) | Value::Array(_)) => {}
            Ok(other) => {
                tracing::debug!("Rejected non-object JSON body: {}", other);
                return ApiError::bad_request(INVALID_JSON_FORMAT).into_response();
            }
            Err(err) => {
                tracing::debug!("Rejected malformed JSON body: {}", err);
                return ApiError::bad_request(INVALID_JSON_FORMAT).into_response();
            }
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
