// API response utility functions module

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::http::build_json_response;
use crate::mapping::MappingError;

/// Serialize `body` as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_string_pretty(body) {
        Ok(json) => build_json_response(status.as_u16(), json),
        Err(e) => {
            logger::log_api_error(&format!("Failed to serialize response: {e}"));
            description_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Error envelope: `{"description": "..."}`
pub fn description_response(status: StatusCode, description: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "description": description });
    build_json_response(status.as_u16(), body.to_string())
}

/// Translate a registration failure to its status and envelope
pub fn mapping_error_response(error: &MappingError) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        logger::log_api_error(&error.to_string());
    }
    description_response(status, &error.to_string())
}

/// 404 Not Found response
pub fn not_found() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "description": "Not Found",
        "available_endpoints": [
            "/api/conf/mapping/controller",
            "/api/conf/mapping/controller/{id}",
            "/api/conf/mapping/router",
            "/api/conf/mapping/router/{id}",
        ]
    });
    build_json_response(StatusCode::NOT_FOUND.as_u16(), body.to_string())
}

/// 405 Method Not Allowed response
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    description_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// 400 Bad Request response
pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    description_response(StatusCode::BAD_REQUEST, message)
}
