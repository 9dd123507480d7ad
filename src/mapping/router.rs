//! Router configurator
//!
//! Routers bind a single proxy handler and never touch the collection store.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::controller::{bind_all, unbind_all};
use super::error::MappingError;
use super::id::{IdGenerator, IdPattern};
use super::model::{HttpMethod, MappingConfig, RouterConfig};
use super::persistence::ConfigPersistence;
use super::registry::{MappingEntry, MappingRegistry};
use crate::endpoint::{EndpointHandler, ProxyHandler};
use crate::logger;
use crate::proxy::ProxyClient;
use crate::routing::Dispatcher;

pub struct RouterConfigurator {
    registry: Arc<Mutex<MappingRegistry>>,
    dispatcher: Arc<Dispatcher>,
    persistence: Arc<dyn ConfigPersistence>,
    client: Arc<dyn ProxyClient>,
    ids: IdGenerator,
}

impl RouterConfigurator {
    pub fn new(
        registry: Arc<Mutex<MappingRegistry>>,
        dispatcher: Arc<Dispatcher>,
        persistence: Arc<dyn ConfigPersistence>,
        client: Arc<dyn ProxyClient>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            persistence,
            client,
            ids: IdGenerator::new(),
        }
    }

    pub async fn register(&self, mut config: RouterConfig) -> Result<RouterConfig, MappingError> {
        let method = validate(&mut config)?;
        let mut registry = self.registry.lock().await;

        let used_urls = vec![config.uri.clone()];
        if let Some(uri) = registry.first_used(method, &used_urls) {
            return Err(MappingError::Validation(format!(
                "Router: Duplicated urls: {uri}"
            )));
        }

        let handler: Arc<dyn EndpointHandler> =
            Arc::new(ProxyHandler::new(&config.to_url, Arc::clone(&self.client)));
        let routes = bind_all(&self.dispatcher, method, vec![(config.uri.clone(), handler)])
            .await
            .map_err(|e| {
                MappingError::Configuration(format!(
                    "Error while register mapping with url [{}] and method [{method}]: {e}",
                    config.uri
                ))
            })?;

        config.id = self.ids.generate(IdPattern::Sequence);
        registry.add_urls(method, &used_urls);
        registry.insert_router(MappingEntry {
            config: config.clone(),
            routes,
            used_urls: used_urls.clone(),
        });

        let persisted = MappingConfig::Router(config.clone());
        if !self.persistence.exists(&persisted).await {
            if let Err(e) = self.persistence.add(&persisted).await {
                logger::log_error(&format!("Can't save router {method} {used_urls:?}: {e}"));
                if let Err(teardown) = self.teardown(&mut registry, &config.id).await {
                    logger::log_error(&format!("Rollback of router failed: {teardown}"));
                }
                return Err(MappingError::Persistence(e));
            }
        }

        logger::log_mapping_registered("router", method.as_str(), &used_urls);
        Ok(config)
    }

    pub async fn unregister(&self, id: &str) -> Result<RouterConfig, MappingError> {
        let mut registry = self.registry.lock().await;
        let entry = self.teardown(&mut registry, id).await?;
        logger::log_mapping_unregistered(
            "router",
            entry.config.method.map_or("-", HttpMethod::as_str),
            &entry.used_urls,
        );
        Ok(entry.config)
    }

    pub async fn get(&self, id: &str) -> Option<RouterConfig> {
        self.registry
            .lock()
            .await
            .router(id)
            .map(|entry| entry.config.clone())
    }

    pub async fn list(&self) -> Vec<RouterConfig> {
        let registry = self.registry.lock().await;
        let mut configs: Vec<RouterConfig> = registry.routers().map(|e| e.config.clone()).collect();
        configs.sort_by_key(|c| (c.id.parse::<u64>().unwrap_or(u64::MAX), c.id.clone()));
        configs
    }

    async fn teardown(
        &self,
        registry: &mut MappingRegistry,
        id: &str,
    ) -> Result<MappingEntry<RouterConfig>, MappingError> {
        let entry = registry
            .router(id)
            .cloned()
            .ok_or_else(|| MappingError::NotFound {
                kind: "router",
                id: id.to_string(),
            })?;

        let persisted = MappingConfig::Router(entry.config.clone());
        if self.persistence.exists(&persisted).await {
            self.persistence.delete(&persisted).await?;
        }

        unbind_all(&self.dispatcher, &entry.routes).await;
        if let Some(method) = entry.config.method {
            registry.remove_urls(method, &entry.used_urls);
        }
        registry.remove_router(id);
        Ok(entry)
    }
}

fn validate(config: &mut RouterConfig) -> Result<HttpMethod, MappingError> {
    if config.uri.trim().is_empty() || config.to_url.trim().is_empty() {
        return Err(MappingError::Validation(
            "Router: Uri and toUrl must be not blank".into(),
        ));
    }
    if config.uri == config.to_url {
        return Err(MappingError::Validation(
            "Router: Uri and toUrl can't be equals".into(),
        ));
    }
    let Some(method) = config.method else {
        return Err(MappingError::Validation(
            "Router: Method must be specified".into(),
        ));
    };
    if config.to_url.contains('\\') {
        config.to_url = config.to_url.replace('\\', "/");
    }
    Ok(method)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointRequest, HandlerResponse, UnconfiguredScriptEngine};
    use crate::mapping::persistence::test_support::MemoryPersistence;
    use crate::mapping::{CollectionStore, ControllerConfig, ControllerConfigurator, FunctionMode};
    use crate::proxy::test_support::RecordingProxyClient;

    struct Fixture {
        routers: RouterConfigurator,
        controllers: ControllerConfigurator,
        registry: Arc<Mutex<MappingRegistry>>,
        dispatcher: Arc<Dispatcher>,
        client: Arc<RecordingProxyClient>,
        persistence: Arc<MemoryPersistence>,
    }

    fn fixture(persistence: MemoryPersistence) -> Fixture {
        let registry = Arc::new(Mutex::new(MappingRegistry::new()));
        let dispatcher = Arc::new(Dispatcher::new());
        let persistence = Arc::new(persistence);
        let client = Arc::new(RecordingProxyClient::new(HandlerResponse::new(
            200,
            Some("upstream".into()),
        )));
        let routers = RouterConfigurator::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            persistence.clone(),
            client.clone(),
        );
        let controllers = ControllerConfigurator::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            Arc::new(CollectionStore::new()),
            persistence.clone(),
            Arc::new(UnconfiguredScriptEngine),
        );
        Fixture {
            routers,
            controllers,
            registry,
            dispatcher,
            client,
            persistence,
        }
    }

    fn router(uri: &str, to_url: &str) -> RouterConfig {
        RouterConfig {
            id: String::new(),
            uri: uri.into(),
            method: Some(HttpMethod::Get),
            to_url: to_url.into(),
        }
    }

    #[tokio::test]
    async fn test_validation() {
        let f = fixture(MemoryPersistence::default());
        let err = f.routers.register(router("/a", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "Router: Uri and toUrl must be not blank");
        let err = f.routers.register(router("/a", "/a")).await.unwrap_err();
        assert_eq!(err.to_string(), "Router: Uri and toUrl can't be equals");
        let mut no_method = router("/a", "/b");
        no_method.method = None;
        let err = f.routers.register(no_method).await.unwrap_err();
        assert_eq!(err.to_string(), "Router: Method must be specified");
    }

    #[tokio::test]
    async fn test_backslashes_normalized() {
        let f = fixture(MemoryPersistence::default());
        let stored = f.routers.register(router("/a", "http:\\\\x\\y")).await.unwrap();
        assert_eq!(stored.to_url, "http://x/y");
    }

    #[tokio::test]
    async fn test_router_forwards() {
        let f = fixture(MemoryPersistence::default());
        let stored = f.routers.register(router("/a", "http://x/y")).await.unwrap();
        assert_eq!(stored.id, "1");

        let response = f
            .dispatcher
            .route(EndpointRequest::new(HttpMethod::Get, "/a"))
            .await
            .unwrap();
        assert_eq!(response.body.as_deref(), Some("upstream"));
        let calls = f.client.calls();
        assert_eq!(calls[0].url, "http://x/y");
        assert_eq!(calls[0].method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn test_uniqueness_across_controllers_and_routers() {
        let f = fixture(MemoryPersistence::default());
        let controller = ControllerConfig {
            uri: "/shared".into(),
            method: Some(HttpMethod::Get),
            function_mode: Some(FunctionMode::Read),
            ..ControllerConfig::default()
        };
        f.controllers.register(controller).await.unwrap();

        let err = f.routers.register(router("/shared", "/elsewhere")).await.unwrap_err();
        assert_eq!(err.to_string(), "Router: Duplicated urls: /shared");

        f.routers.register(router("/routed", "/elsewhere")).await.unwrap();
        let clash = ControllerConfig {
            uri: "/routed/".into(),
            method: Some(HttpMethod::Get),
            function_mode: Some(FunctionMode::Read),
            ..ControllerConfig::default()
        };
        assert!(matches!(
            f.controllers.register(clash).await,
            Err(MappingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unregister_restores_state() {
        let f = fixture(MemoryPersistence::default());
        let stored = f.routers.register(router("/a", "/b")).await.unwrap();
        assert_eq!(f.persistence.len(), 1);
        assert_eq!(f.routers.list().await.len(), 1);

        let removed = f.routers.unregister(&stored.id).await.unwrap();
        assert_eq!(removed.to_url, "/b");
        assert!(f.registry.lock().await.is_empty());
        assert_eq!(f.persistence.len(), 0);
        assert!(f.routers.get(&stored.id).await.is_none());
        assert!(matches!(
            f.routers.unregister(&stored.id).await,
            Err(MappingError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_persistence_failure_rolls_back() {
        let f = fixture(MemoryPersistence::failing());
        let err = f.routers.register(router("/a", "/b")).await.unwrap_err();
        assert!(matches!(err, MappingError::Persistence(_)));
        assert!(f.registry.lock().await.is_empty());
        assert_eq!(f.dispatcher.route_count().await, 0);
    }
}
