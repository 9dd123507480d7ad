// Mapping configuration handlers module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;

use super::response::{bad_request, json_response, mapping_error_response};
use crate::mapping::{MappingError, MappingKind, MappingService};

/// Decode a posted configuration; blank bodies and bad JSON are rejected
fn parse_config<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response<Full<Bytes>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(bad_request("Configuration is empty"));
    }
    serde_json::from_slice(body).map_err(|e| bad_request(&e.to_string()))
}

fn not_found(kind: MappingKind, id: &str) -> Response<Full<Bytes>> {
    let kind = match kind {
        MappingKind::Controller => "controller",
        MappingKind::Router => "router",
    };
    mapping_error_response(&MappingError::NotFound {
        kind,
        id: id.to_string(),
    })
}

/// All configurations of one kind, ordered by id
pub async fn handle_list(mappings: &MappingService, kind: MappingKind) -> Response<Full<Bytes>> {
    match kind {
        MappingKind::Controller => json_response(StatusCode::OK, &mappings.controllers.list().await),
        MappingKind::Router => json_response(StatusCode::OK, &mappings.routers.list().await),
    }
}

pub async fn handle_get(
    mappings: &MappingService,
    kind: MappingKind,
    id: &str,
) -> Response<Full<Bytes>> {
    let found = match kind {
        MappingKind::Controller => mappings
            .controllers
            .get(id)
            .await
            .map(|c| json_response(StatusCode::OK, &c)),
        MappingKind::Router => mappings
            .routers
            .get(id)
            .await
            .map(|r| json_response(StatusCode::OK, &r)),
    };
    found.unwrap_or_else(|| not_found(kind, id))
}

/// Register a new mapping; answers with the stored configuration
pub async fn handle_register(
    mappings: &MappingService,
    kind: MappingKind,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let result = match kind {
        MappingKind::Controller => match parse_config(body) {
            Ok(config) => mappings
                .controllers
                .register(config)
                .await
                .map(|stored| json_response(StatusCode::OK, &stored)),
            Err(response) => return response,
        },
        MappingKind::Router => match parse_config(body) {
            Ok(config) => mappings
                .routers
                .register(config)
                .await
                .map(|stored| json_response(StatusCode::OK, &stored)),
            Err(response) => return response,
        },
    };
    result.unwrap_or_else(|e| mapping_error_response(&e))
}

/// Remove a mapping; answers with what was removed
pub async fn handle_unregister(
    mappings: &MappingService,
    kind: MappingKind,
    id: &str,
) -> Response<Full<Bytes>> {
    let result = match kind {
        MappingKind::Controller => mappings
            .controllers
            .unregister(id)
            .await
            .map(|removed| json_response(StatusCode::OK, &removed)),
        MappingKind::Router => mappings
            .routers
            .unregister(id)
            .await
            .map(|removed| json_response(StatusCode::OK, &removed)),
    };
    result.unwrap_or_else(|e| mapping_error_response(&e))
}
