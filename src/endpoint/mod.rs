//! Endpoint handlers
//!
//! Every bound (verb, uri) pair is served by one `EndpointHandler`. The
//! concrete handler type and its mode are chosen at registration time, so a
//! request only ever runs one branch.

mod create;
mod delete;
mod proxy;
mod read;
mod script;
mod update;

pub use create::CreateHandler;
pub use delete::DeleteHandler;
pub use proxy::ProxyHandler;
pub use read::ReadHandler;
pub use script::{ScriptAnswer, ScriptContext, ScriptEngine, ScriptHandler, UnconfiguredScriptEngine};
pub use update::UpdateHandler;

#[cfg(test)]
pub(crate) use script::test_support::EchoScriptEngine;

use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::mapping::HttpMethod;

/// Header name -> values, names lowercased
pub type Headers = BTreeMap<String, Vec<String>>;

/// Inbound request as seen by handlers
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Option<String>,
    /// Filled by the dispatcher from the matched template
    pub path_params: HashMap<String, String>,
    pub headers: Headers,
    /// `None` for an empty body
    pub body: Option<String>,
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl EndpointRequest {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: None,
            path_params: HashMap::new(),
            headers: Headers::new(),
            body: None,
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 80,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = (!body.is_empty()).then(|| body.to_string());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
        self
    }
}

/// Handler result, translated to the wire by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Option<String>,
    pub headers: Headers,
}

impl HandlerResponse {
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self {
            status,
            body,
            headers: Headers::new(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, Some(body.into()))
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, Some(value.to_string()))
    }

    /// `{"description": "..."}` error envelope
    pub fn error(status: u16, description: &str) -> Self {
        Self::json(status, &json!({ "description": description }))
    }
}

/// A request handler bound to one (verb, uri) pair
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse;

    /// Short label used in logs
    fn name(&self) -> &'static str;
}

/// Sleeps before delegating; only the delayed request waits
pub struct DelayedHandler {
    delay: Duration,
    inner: Arc<dyn EndpointHandler>,
}

impl DelayedHandler {
    /// Wrap `inner` when `delay_ms` is non-zero
    pub fn wrap(delay_ms: u64, inner: Arc<dyn EndpointHandler>) -> Arc<dyn EndpointHandler> {
        if delay_ms == 0 {
            inner
        } else {
            Arc::new(Self {
                delay: Duration::from_millis(delay_ms),
                inner,
            })
        }
    }
}

#[async_trait]
impl EndpointHandler for DelayedHandler {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse {
        tokio::time::sleep(self.delay).await;
        self.inner.handle(request).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Shared STATIC branch of the modify handlers: the configured answer if
/// non-blank, otherwise the request body echoed, otherwise 400
fn answer_or_body(answer: Option<&str>, body: Option<String>) -> HandlerResponse {
    match (answer.filter(|a| !a.trim().is_empty()), body) {
        (Some(answer), _) => HandlerResponse::ok(answer),
        (None, Some(body)) => HandlerResponse::ok(body),
        (None, None) => HandlerResponse::error(400, "body is null"),
    }
}

/// Parse a body into a non-empty JSON object
fn parse_record(body: &str) -> Result<crate::mapping::Record, HandlerResponse> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(HandlerResponse::error(
            400,
            &format!("data [{body}] is not json"),
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_or_body() {
        assert_eq!(answer_or_body(Some("x"), None).body.as_deref(), Some("x"));
        assert_eq!(
            answer_or_body(Some("  "), Some("b".into())).body.as_deref(),
            Some("b")
        );
        let missing = answer_or_body(None, None);
        assert_eq!(missing.status, 400);
        assert_eq!(
            missing.body.as_deref(),
            Some(r#"{"description":"body is null"}"#)
        );
    }

    #[test]
    fn test_parse_record() {
        assert!(parse_record(r#"{"a":1}"#).is_ok());
        let err = parse_record("[1]").unwrap_err();
        assert_eq!(err.body.as_deref(), Some(r#"{"description":"data [[1]] is not json"}"#));
        assert!(parse_record("{}").is_err());
        assert!(parse_record("nope").is_err());
    }

    #[test]
    fn test_empty_body_is_none() {
        let request = EndpointRequest::new(HttpMethod::Post, "/x").with_body("");
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_delayed_handler_waits() {
        let inner = test_support::FixedHandler::new("late");
        let handler = DelayedHandler::wrap(30, inner);
        let started = std::time::Instant::now();
        let response = handler
            .handle(EndpointRequest::new(HttpMethod::Get, "/x"))
            .await;
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(response.body.as_deref(), Some("late"));
    }
}
