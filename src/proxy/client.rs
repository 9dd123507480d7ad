use async_trait::async_trait;
use reqwest::redirect::Policy;

use super::{is_hop_by_hop_header, ProxyClient, PROXY_TIMEOUT};
use crate::endpoint::{HandlerResponse, Headers};
use crate::mapping::HttpMethod;

/// Pooled upstream client; http and https targets, redirects are relayed
/// rather than followed
#[derive(Clone)]
pub struct HttpProxyClient {
    client: reqwest::Client,
}

impl HttpProxyClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(PROXY_TIMEOUT)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }

    async fn forward(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<HandlerResponse, String> {
        let mut builder = self.client.request(method.to_hyper(), url);
        for (name, values) in headers {
            if is_hop_by_hop_header(name) {
                continue;
            }
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        let request = builder
            .body(body.unwrap_or_default())
            .build()
            .map_err(|e| format!("invalid upstream request to {url}: {e}"))?;

        let response = self.client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                format!("request to {url} timed out after {}s", PROXY_TIMEOUT.as_secs())
            } else if e.is_connect() {
                format!("connection to {url} failed: {e}")
            } else {
                format!("request to {url} failed: {e}")
            }
        })?;

        let status = response.status().as_u16();
        let mut relayed = Headers::new();
        for (name, value) in response.headers() {
            if is_hop_by_hop_header(name.as_str()) {
                continue;
            }
            relayed
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("reading response from {url} failed: {e}"))?;
        let body = (!bytes.is_empty()).then(|| String::from_utf8_lossy(&bytes).into_owned());

        Ok(HandlerResponse {
            status,
            body,
            headers: relayed,
        })
    }
}

#[async_trait]
impl ProxyClient for HttpProxyClient {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> HandlerResponse {
        match self.forward(method, url, headers, body).await {
            Ok(response) => response,
            Err(message) => {
                crate::logger::log_warning(&format!("[Proxy] {method} {message}"));
                HandlerResponse::new(500, Some(message))
            }
        }
    }
}
