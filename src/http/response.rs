//! HTTP response building module
//!
//! Turns handler results and fixed error pages into hyper responses.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::endpoint::HandlerResponse;

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_text_response(404, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    build_text_response(405, "405 Method Not Allowed")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_text_response(413, "413 Payload Too Large")
}

/// Build 400 Bad Request response for unreadable request bodies
pub fn build_400_response(reason: &str) -> Response<Full<Bytes>> {
    build_text_response(400, &format!("400 Bad Request: {reason}"))
}

fn build_text_response(status: u16, text: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(text.to_string())))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from(text.to_string())))
        })
}

/// Build a JSON response
pub fn build_json_response(status: u16, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Translate a handler result to the wire
///
/// Relayed headers are written verbatim. Without a `content-type` the body
/// is labelled JSON when it looks like an object or array.
pub fn build_endpoint_response(response: HandlerResponse) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(response.status);
    for (name, values) in &response.headers {
        for value in values {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    let body = response.body.unwrap_or_default();
    if !response.headers.contains_key("content-type") && !body.is_empty() {
        builder = builder.header("Content-Type", guess_content_type(&body));
    }

    builder.body(Full::new(Bytes::from(body))).unwrap_or_else(|e| {
        log_build_error(&response.status.to_string(), &e);
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

fn guess_content_type(body: &str) -> &'static str {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
