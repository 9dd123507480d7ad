//! Script-backed endpoints
//!
//! The engine is a plugin. Scripts run on the blocking pool with full access
//! to the collection store and no sandboxing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{EndpointHandler, EndpointRequest, HandlerResponse, Headers};
use crate::mapping::{CollectionStore, HttpMethod, ScriptError};

/// Everything a script can see about the request
#[derive(Debug, Clone)]
pub struct ScriptContext {
    /// Configured uri template of the controller
    pub uri: String,
    pub method: HttpMethod,
    pub body: Option<String>,
    pub headers: Headers,
    pub path_params: HashMap<String, String>,
    pub store: Arc<CollectionStore>,
}

/// Script result; a missing status means 200
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptAnswer {
    pub status: Option<u16>,
    pub body: Option<String>,
}

pub trait ScriptEngine: Send + Sync {
    fn evaluate(&self, source: &str, context: ScriptContext) -> Result<ScriptAnswer, ScriptError>;

    /// False when no script can ever run; script controllers are then refused
    fn is_configured(&self) -> bool {
        true
    }
}

/// Default engine; rejects every evaluation
#[derive(Debug, Default)]
pub struct UnconfiguredScriptEngine;

impl ScriptEngine for UnconfiguredScriptEngine {
    fn evaluate(&self, _source: &str, _context: ScriptContext) -> Result<ScriptAnswer, ScriptError> {
        Err(ScriptError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

pub struct ScriptHandler {
    uri: String,
    source: Arc<str>,
    engine: Arc<dyn ScriptEngine>,
    store: Arc<CollectionStore>,
}

impl ScriptHandler {
    pub fn new(uri: &str, source: &str, engine: Arc<dyn ScriptEngine>, store: Arc<CollectionStore>) -> Self {
        Self {
            uri: uri.to_string(),
            source: Arc::from(source),
            engine,
            store,
        }
    }
}

#[async_trait]
impl EndpointHandler for ScriptHandler {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse {
        let context = ScriptContext {
            uri: self.uri.clone(),
            method: request.method,
            body: request.body,
            headers: request.headers,
            path_params: request.path_params,
            store: Arc::clone(&self.store),
        };
        let engine = Arc::clone(&self.engine);
        let source = Arc::clone(&self.source);

        let outcome = tokio::task::spawn_blocking(move || engine.evaluate(&source, context)).await;
        match outcome {
            Ok(Ok(answer)) => HandlerResponse::new(answer.status.unwrap_or(200), answer.body),
            Ok(Err(e)) => {
                crate::logger::log_warning(&format!("Script on {} failed: {e}", self.uri));
                HandlerResponse::error(500, &e.to_string())
            }
            Err(e) => {
                crate::logger::log_error(&format!("Script on {} panicked: {e}", self.uri));
                HandlerResponse::error(500, &e.to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        "script"
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::EchoScriptEngine;
    use super::*;

    fn handler(source: &str, engine: Arc<dyn ScriptEngine>) -> ScriptHandler {
        ScriptHandler::new("/s/{id}", source, engine, Arc::new(CollectionStore::new()))
    }

    fn request() -> EndpointRequest {
        EndpointRequest::new(HttpMethod::Post, "/s/1").with_body("in")
    }

    #[tokio::test]
    async fn test_default_status_is_200() {
        let response = handler("hi", Arc::new(EchoScriptEngine)).handle(request()).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_deref(), Some("hi:POST:/s/{id}"));
    }

    #[tokio::test]
    async fn test_script_sets_status() {
        let response = handler("created", Arc::new(EchoScriptEngine)).handle(request()).await;
        assert_eq!(response.status, 201);
        assert_eq!(response.body.as_deref(), Some("in"));
    }

    #[tokio::test]
    async fn test_script_sees_store() {
        let response = handler("count", Arc::new(EchoScriptEngine)).handle(request()).await;
        assert_eq!(response.body.as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_errors_become_500() {
        let failed = handler("fail", Arc::new(EchoScriptEngine)).handle(request()).await;
        assert_eq!(failed.status, 500);
        assert_eq!(failed.body.as_deref(), Some(r#"{"description":"script blew up"}"#));

        let panicked = handler("panic", Arc::new(EchoScriptEngine)).handle(request()).await;
        assert_eq!(panicked.status, 500);
    }

    #[tokio::test]
    async fn test_unconfigured_engine() {
        assert!(!UnconfiguredScriptEngine.is_configured());
        assert!(EchoScriptEngine.is_configured());
        let response = handler("x", Arc::new(UnconfiguredScriptEngine)).handle(request()).await;
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body.as_deref(),
            Some(r#"{"description":"script engine is not configured"}"#)
        );
    }
}
