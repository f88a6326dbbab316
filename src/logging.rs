//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// Form fields whose values must never reach the logs.
const REDACTED_FIELDS: [&str; 3] = ["password", "confirm_password", "new_password"];

/// Bodies longer than this are truncated at the `info` level and logged in
/// full at `debug`.
const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log each request and response at the `info` level.
///
/// Password fields in urlencoded form bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();

    let is_form_post = parts.method == axum::http::Method::POST
        && parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_form_post {
        let mut display_text = body_text.clone();
        for field_name in REDACTED_FIELDS {
            display_text = redact_field(&display_text, field_name);
        }
        log_body("Received request", &format!("{parts:#?}"), &display_text);
    } else {
        log_body("Received request", &format!("{parts:#?}"), &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();
    log_body("Sending response", &format!("{parts:#?}"), &body_text);

    Response::from_parts(parts, body_bytes.into())
}

/// Replace the value of `field_name` in a urlencoded form body with asterisks.
fn redact_field(form_text: &str, field_name: &str) -> String {
    let marker = format!("{field_name}=");

    let Some(start) = form_text.find(&marker) else {
        return form_text.to_owned();
    };

    let value_start = start + marker.len();
    let value_end = form_text[value_start..]
        .find('&')
        .map(|offset| value_start + offset)
        .unwrap_or(form_text.len());

    let mut redacted = form_text.to_owned();
    redacted.replace_range(value_start..value_end, "********");

    redacted
}

fn log_body(direction: &str, headers: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let preview: String = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect();
        tracing::info!("{direction}: {headers}\nbody: {preview}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{direction}: {headers}\nbody: {body:?}");
    }
}
