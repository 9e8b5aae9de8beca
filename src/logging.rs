//! Middleware for logging requests and responses.

use axum::{extract::Request, middleware::Next, response::Response};

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level. If a body is
/// longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated and the full
/// body logged at the `debug` level. The OAuth authorization code is
/// redacted from logged callback URLs.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();

    let display_uri = redact_query_param(&parts.uri.to_string(), "code");
    log_payload("Received request", &format!("{} {}", parts.method, display_uri), &body_text);

    let request = Request::from_parts(parts, body_bytes.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();

    log_payload("Sending response", &parts.status.to_string(), &body_text);

    Response::from_parts(parts, body_bytes.into())
}

/// Replace the value of `param_name` in a URI's query string with asterisks.
fn redact_query_param(uri: &str, param_name: &str) -> String {
    let marker = format!("{}=", param_name);

    let start = match uri.find(&marker) {
        Some(position) => position,
        None => return uri.to_string(),
    };

    let end = match uri[start..].find('&') {
        Some(end) => start + end,
        None => uri.len(),
    };

    uri.replace(&uri[start..end], &format!("{}=********", param_name))
}

fn log_payload(direction: &str, summary: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{direction}: {summary}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{direction}: {summary}\nbody: {body:?}");
    }
}
