//! Outbound HTTP client used by router endpoints
//!
//! Transport failures never propagate: they come back as a synthetic 500
//! whose body is the error message.

mod client;

pub use client::HttpProxyClient;

use async_trait::async_trait;
use std::time::Duration;

use crate::endpoint::{HandlerResponse, Headers};
use crate::mapping::HttpMethod;

/// Fixed upstream timeout, connect through last body byte
pub const PROXY_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait ProxyClient: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> HandlerResponse;
}

/// Headers that describe a single connection and are never relayed
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}
