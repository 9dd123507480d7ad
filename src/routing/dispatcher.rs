//! Route dispatcher
//!
//! Per-verb table of uri templates. Lookups hold the read lock only long
//! enough to clone the matched handler.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::template::UriTemplate;
use crate::endpoint::{EndpointHandler, EndpointRequest, HandlerResponse};
use crate::http::{build_404_response, build_endpoint_response};
use crate::mapping::{DispatchError, HttpMethod};

struct RouteEntry {
    template: UriTemplate,
    handler: Arc<dyn EndpointHandler>,
}

#[derive(Default)]
pub struct Dispatcher {
    routes: RwLock<HashMap<HttpMethod, Vec<RouteEntry>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler; a template with the same shape on the same verb is a conflict
    pub async fn add(
        &self,
        method: HttpMethod,
        template: &str,
        handler: Arc<dyn EndpointHandler>,
    ) -> Result<(), DispatchError> {
        let template = UriTemplate::parse(template).map_err(DispatchError::InvalidTemplate)?;
        let mut routes = self.routes.write().await;
        let entries = routes.entry(method).or_default();
        if entries.iter().any(|e| e.template.shape() == template.shape()) {
            return Err(DispatchError::Conflict {
                method: method.to_string(),
                template: template.raw().to_string(),
            });
        }
        entries.push(RouteEntry { template, handler });
        Ok(())
    }

    /// Unbind; returns whether a route was removed
    pub async fn remove(&self, method: HttpMethod, template: &str) -> bool {
        let Ok(template) = UriTemplate::parse(template) else {
            return false;
        };
        let shape = template.shape();
        let mut routes = self.routes.write().await;
        let Some(entries) = routes.get_mut(&method) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.template.shape() != shape);
        before != entries.len()
    }

    pub async fn has_route(&self, method: HttpMethod, template: &str) -> bool {
        let Ok(template) = UriTemplate::parse(template) else {
            return false;
        };
        let shape = template.shape();
        self.routes
            .read()
            .await
            .get(&method)
            .is_some_and(|entries| entries.iter().any(|e| e.template.shape() == shape))
    }

    pub async fn route_count(&self) -> usize {
        self.routes.read().await.values().map(Vec::len).sum()
    }

    /// Find the most specific match and run its handler
    pub async fn route(&self, request: EndpointRequest) -> Option<HandlerResponse> {
        self.route_named(request).await.map(|(_, response)| response)
    }

    /// Like `route`, also naming the handler that answered
    pub async fn route_named(
        &self,
        mut request: EndpointRequest,
    ) -> Option<(&'static str, HandlerResponse)> {
        let (handler, params) = {
            let routes = self.routes.read().await;
            let entries = routes.get(&request.method)?;
            let mut best: Option<(&RouteEntry, HashMap<String, String>)> = None;
            for entry in entries {
                let Some(params) = entry.template.matches(&request.path) else {
                    continue;
                };
                let better = best
                    .as_ref()
                    .map_or(true, |(b, _)| entry.template.literal_count() > b.template.literal_count());
                if better {
                    best = Some((entry, params));
                }
            }
            let (entry, params) = best?;
            (Arc::clone(&entry.handler), params)
        };
        request.path_params = params;
        crate::logger::log_trace(&format!(
            "{} {} -> {}",
            request.method,
            request.path,
            handler.name()
        ));
        Some((handler.name(), handler.handle(request).await))
    }

    /// Route and translate to a wire response; unmatched requests get 404
    /// and the handler name `-`
    pub async fn dispatch(&self, request: EndpointRequest) -> (Response<Full<Bytes>>, &'static str) {
        match self.route_named(request).await {
            Some((name, response)) => (build_endpoint_response(response), name),
            None => (build_404_response(), "-"),
        }
    }
}
