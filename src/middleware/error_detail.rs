use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::error::ErrorDetail;
use crate::AppState;

/// Upper bound on a 500 body we are willing to buffer and rewrite.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Outside production, copies the internal cause of a 500 into its JSON body as `detail`.
pub async fn expose_error_detail(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if state.config.is_production() {
        return response;
    }

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    let rewritten = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut map)) => {
            map.insert("detail".to_string(), Value::String(detail));
            serde_json::to_vec(&map).map(Bytes::from).unwrap_or(bytes)
        }
        _ => bytes,
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(rewritten))
}
