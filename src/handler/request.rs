//! Endpoint request handling
//!
//! Turns a hyper request into an `EndpointRequest`, dispatches it through the
//! route table and writes the access log.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, HOST, REFERER, SERVER, USER_AGENT};
use hyper::{Request, Response, Uri, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::endpoint::EndpointRequest;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::mapping::HttpMethod;

/// Main entry point for endpoint traffic
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.referer = header_text(&parts.headers, REFERER.as_str());
    entry.user_agent = header_text(&parts.headers, USER_AGENT.as_str());

    logger::log_headers_count(parts.headers.len(), state.config.logging.show_headers);

    let (mut response, handler) = match HttpMethod::from_hyper(&parts.method) {
        None => {
            logger::log_warning(&format!("Method not allowed: {}", parts.method));
            (http::build_405_response(), "-")
        }
        Some(method) => {
            let max_body_size = state.config.http.max_body_size;
            match read_body(body, &parts.headers, max_body_size).await {
                Err(rejection) => (rejection, "-"),
                Ok(body) => {
                    let request = build_endpoint_request(
                        method,
                        &parts.uri,
                        &parts.headers,
                        &body,
                        state.config.server.port,
                    );
                    state.mappings.dispatcher.dispatch(request).await
                }
            }
        }
    };

    if !response.headers().contains_key(SERVER) {
        if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
            response.headers_mut().insert(SERVER, value);
        }
    }

    if state.access_log_enabled() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.handler = handler.to_string();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Collect the body, answering 413 past `max_body_size`
async fn read_body<B>(
    body: B,
    headers: &HeaderMap,
    max_body_size: u64,
) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    if let Some(size) = header_text(headers, "content-length").and_then(|v| v.parse::<u64>().ok()) {
        if size > max_body_size {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return Err(http::build_413_response());
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!("Request body exceeds {max_body_size} bytes"));
            Err(http::build_413_response())
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Err(http::build_400_response(&e.to_string()))
        }
    }
}

/// Request model handed to endpoint handlers
///
/// Host and port come from the `Host` header, falling back to the listener
/// port when the header carries none.
pub fn build_endpoint_request(
    method: HttpMethod,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
    listener_port: u16,
) -> EndpointRequest {
    let mut request = EndpointRequest::new(method, uri.path());
    request.query = uri.query().map(ToString::to_string);
    request.scheme = uri.scheme_str().unwrap_or("http").to_string();

    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    let host_header = header_text(headers, HOST.as_str()).or_else(|| uri.authority().map(ToString::to_string));
    let (host, port) = split_host(host_header.as_deref().unwrap_or("localhost"), listener_port);
    request.host = host;
    request.port = port;

    request.with_body(&String::from_utf8_lossy(body))
}

fn split_host(authority: &str, default_port: u16) -> (String, u16) {
    // bracketed IPv6 keeps its colons
    if let Some(rest) = authority.strip_prefix('[') {
        if let Some((ip, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or(default_port);
            return (format!("[{ip}]"), port);
        }
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (authority.to_string(), default_port),
        },
        None => (authority.to_string(), default_port),
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
