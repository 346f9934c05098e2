// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::to_bytes;
use axum::{body::Body, extract::Request, http::StatusCode, middleware::Next, response::Response};
use serde_json::Value;
use tracing::{debug, Level};

const REDACTED: &str = "[redacted]";

/// Replace the value of every key naming a password or token, at any depth
fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                let key = key.to_ascii_lowercase();
                if key.contains("password") || key.contains("token") {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

/// JSON bodies are logged with secrets redacted; anything else is summarized
/// by length only.
fn describe_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            redact(&mut json);
            serde_json::to_string_pretty(&json).unwrap_or_default()
        }
        Err(_) => format!("<{} bytes>", bytes.len()),
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        debug!(
            method = %parts.method,
            uri = %parts.uri.path(),
            request_body = %describe_body(&bytes),
            "Request"
        );
    }

    let response = next
        .run(Request::from_parts(parts, Body::from(bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        debug!(
            status = %parts.status,
            response_body = %describe_body(&bytes),
            "Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_secret_fields_at_any_depth() {
        let mut body = json!({
            "email": "a@x.com",
            "password": "secret1",
            "nested": { "resetToken": "abc", "name": "A" },
            "list": [{ "newPassword": "x" }]
        });
        redact(&mut body);
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["password"], REDACTED);
        assert_eq!(body["nested"]["resetToken"], REDACTED);
        assert_eq!(body["nested"]["name"], "A");
        assert_eq!(body["list"][0]["newPassword"], REDACTED);
    }

    #[test]
    fn test_non_json_body_is_summarized() {
        assert_eq!(describe_body(b"<html></html>"), "<13 bytes>");
    }
}
