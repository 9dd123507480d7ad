// API module entry
// Management API for controller and router mappings

mod handlers;
mod response;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;
use crate::mapping::{MappingKind, MappingService};

pub use response::*;

const MAPPING_PREFIX: &str = "/api/conf/mapping/";

/// Management route: which registry and, optionally, which id
#[derive(Debug, PartialEq, Eq)]
struct ApiRoute<'a> {
    kind: MappingKind,
    id: Option<&'a str>,
}

fn parse_route(path: &str) -> Option<ApiRoute<'_>> {
    let rest = path.strip_prefix(MAPPING_PREFIX)?.trim_end_matches('/');
    let (kind, id) = match rest.split_once('/') {
        Some((kind, id)) if !id.is_empty() && !id.contains('/') => (kind, Some(id)),
        Some(_) => return None,
        None => (rest, None),
    };
    let kind = match kind {
        "controller" => MappingKind::Controller,
        "router" => MappingKind::Router,
        _ => return None,
    };
    Some(ApiRoute { kind, id })
}

/// API route handler
///
/// Dispatches to handler functions based on request path and method
pub async fn handle_api_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let body = if method == Method::POST {
        let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
        match Limited::new(req.into_body(), limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                let response = bad_request(&format!("Failed to read request body: {e}"));
                logger::log_api_request(method.as_str(), &path, response.status().as_u16());
                return Ok(response);
            }
        }
    } else {
        Bytes::new()
    };

    let response = route(&state.mappings, &method, &path, &body).await;
    logger::log_api_request(method.as_str(), &path, response.status().as_u16());
    Ok(response)
}

async fn route(
    mappings: &MappingService,
    method: &Method,
    path: &str,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let Some(ApiRoute { kind, id }) = parse_route(path) else {
        return not_found();
    };

    match (method, id) {
        (&Method::GET, None) => handlers::handle_list(mappings, kind).await,
        (&Method::POST, None) => handlers::handle_register(mappings, kind, body).await,
        (&Method::GET, Some(id)) => handlers::handle_get(mappings, kind, id).await,
        (&Method::DELETE, Some(id)) => handlers::handle_unregister(mappings, kind, id).await,
        _ => method_not_allowed(),
    }
}
