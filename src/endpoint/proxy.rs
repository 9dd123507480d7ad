use async_trait::async_trait;
use std::sync::Arc;

use super::{EndpointHandler, EndpointRequest, HandlerResponse};
use crate::proxy::ProxyClient;

/// Router endpoints: forward to `to_url` and relay the answer
pub struct ProxyHandler {
    to_url: String,
    client: Arc<dyn ProxyClient>,
}

impl ProxyHandler {
    pub fn new(to_url: &str, client: Arc<dyn ProxyClient>) -> Self {
        Self {
            to_url: to_url.to_string(),
            client,
        }
    }

    /// Absolute targets are used as-is; anything else is resolved against
    /// the inbound scheme, host and port
    pub fn target_url(&self, request: &EndpointRequest) -> String {
        if self.to_url.contains("://") {
            return self.to_url.clone();
        }
        let separator = if self.to_url.starts_with('/') { "" } else { "/" };
        format!(
            "{}://{}:{}{separator}{}",
            request.scheme, request.host, request.port, self.to_url
        )
    }
}

#[async_trait]
impl EndpointHandler for ProxyHandler {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse {
        let url = self.target_url(&request);
        // bound to a single verb, so the inbound method is the configured one
        self.client
            .execute(request.method, &url, &request.headers, request.body)
            .await
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}
