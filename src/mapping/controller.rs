//! Controller configurator
//!
//! Validates a controller configuration, builds its handlers, binds them in
//! the dispatcher and records everything in the registry and persistence.
//! Any failure after binding is undone by the same teardown that serves
//! `unregister`.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::MappingError;
use super::id::{IdGenerator, IdPattern};
use super::model::{ControllerConfig, FunctionMode, HttpMethod, MappingConfig, SaveInfoMode};
use super::persistence::ConfigPersistence;
use super::registry::{BoundRoute, MappingEntry, MappingRegistry};
use super::store::{CollectionStore, Record};
use crate::endpoint::{
    CreateHandler, DelayedHandler, DeleteHandler, EndpointHandler, ReadHandler, ScriptEngine,
    ScriptHandler, UpdateHandler,
};
use crate::logger;
use crate::routing::template::{base_uri, id_params, normalize};
use crate::routing::Dispatcher;

type Plan = Vec<(String, Arc<dyn EndpointHandler>)>;

pub struct ControllerConfigurator {
    registry: Arc<Mutex<MappingRegistry>>,
    dispatcher: Arc<Dispatcher>,
    store: Arc<CollectionStore>,
    persistence: Arc<dyn ConfigPersistence>,
    scripts: Arc<dyn ScriptEngine>,
    ids: IdGenerator,
}

impl ControllerConfigurator {
    pub fn new(
        registry: Arc<Mutex<MappingRegistry>>,
        dispatcher: Arc<Dispatcher>,
        store: Arc<CollectionStore>,
        persistence: Arc<dyn ConfigPersistence>,
        scripts: Arc<dyn ScriptEngine>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            store,
            persistence,
            scripts,
            ids: IdGenerator::new(),
        }
    }

    /// Register a controller, returning the stored configuration with its
    /// assigned id and derived id parameters
    pub async fn register(&self, mut config: ControllerConfig) -> Result<ControllerConfig, MappingError> {
        let (method, function_mode) = validate(&config)?;
        if function_mode == FunctionMode::Script && !self.scripts.is_configured() {
            return Err(MappingError::Validation(
                "Controller: script engine is not configured".into(),
            ));
        }
        let params = id_params(&config.uri);
        let mode = SaveInfoMode::identify(function_mode, &params);
        config.id_params = if mode == SaveInfoMode::Collection {
            params
        } else {
            Vec::new()
        };

        let mut registry = self.registry.lock().await;

        let plan = self.plan(&config, function_mode, mode);
        let used_urls: Vec<String> = plan.iter().map(|(uri, _)| uri.clone()).collect();
        let mut candidates = vec![config.uri.clone()];
        candidates.extend(used_urls.iter().cloned());
        if let Some(uri) = registry.first_used(method, &candidates) {
            return Err(MappingError::Validation(format!(
                "Controller: Duplicated urls: {uri}"
            )));
        }

        let routes = bind_all(&self.dispatcher, method, plan)
            .await
            .map_err(|e| {
                MappingError::Configuration(format!(
                    "Error while register mapping with url [{}] and method [{method}]: {e}",
                    config.uri
                ))
            })?;

        config.id = self.ids.generate(IdPattern::Sequence);

        registry.add_urls(method, &used_urls);
        registry.insert_controller(MappingEntry {
            config: config.clone(),
            routes,
            used_urls: used_urls.clone(),
        });

        let persisted = MappingConfig::Controller(config.clone());
        if !self.persistence.exists(&persisted).await {
            if let Err(e) = self.persistence.add(&persisted).await {
                logger::log_error(&format!(
                    "Can't save controller {method} {:?}: {e}",
                    used_urls
                ));
                if let Err(teardown) = self.teardown(&mut registry, &config.id).await {
                    logger::log_error(&format!("Rollback of controller failed: {teardown}"));
                }
                return Err(MappingError::Persistence(e));
            }
        }

        // nothing past persistence is rolled back
        if mode == SaveInfoMode::Collection {
            self.seed(&config);
        }

        logger::log_mapping_registered("controller", method.as_str(), &used_urls);
        Ok(config)
    }

    /// Remove a controller, returning its configuration
    pub async fn unregister(&self, id: &str) -> Result<ControllerConfig, MappingError> {
        let mut registry = self.registry.lock().await;
        let entry = self.teardown(&mut registry, id).await?;
        logger::log_mapping_unregistered(
            "controller",
            entry.config.method.map_or("-", HttpMethod::as_str),
            &entry.used_urls,
        );
        Ok(entry.config)
    }

    pub async fn get(&self, id: &str) -> Option<ControllerConfig> {
        self.registry
            .lock()
            .await
            .controller(id)
            .map(|entry| entry.config.clone())
    }

    /// All controllers ordered by numeric id
    pub async fn list(&self) -> Vec<ControllerConfig> {
        let registry = self.registry.lock().await;
        let mut configs: Vec<ControllerConfig> =
            registry.controllers().map(|e| e.config.clone()).collect();
        configs.sort_by_key(|c| (c.id.parse::<u64>().unwrap_or(u64::MAX), c.id.clone()));
        configs
    }

    // Persistence first, so a failed delete leaves everything in place.
    async fn teardown(
        &self,
        registry: &mut MappingRegistry,
        id: &str,
    ) -> Result<MappingEntry<ControllerConfig>, MappingError> {
        let entry = registry
            .controller(id)
            .cloned()
            .ok_or_else(|| MappingError::NotFound {
                kind: "controller",
                id: id.to_string(),
            })?;

        let persisted = MappingConfig::Controller(entry.config.clone());
        if self.persistence.exists(&persisted).await {
            self.persistence.delete(&persisted).await?;
        }

        unbind_all(&self.dispatcher, &entry.routes).await;
        if let Some(method) = entry.config.method {
            registry.remove_urls(method, &entry.used_urls);
        }
        registry.remove_controller(id);

        if !registry.uri_still_served(&entry.config.uri) {
            self.store.delete_all(&normalize(&entry.config.uri));
        }
        Ok(entry)
    }

    fn plan(&self, config: &ControllerConfig, function_mode: FunctionMode, mode: SaveInfoMode) -> Plan {
        let data_uri = normalize(&config.uri);
        let store = || Arc::clone(&self.store);
        let wrap = |handler: Arc<dyn EndpointHandler>| DelayedHandler::wrap(config.delay_ms, handler);
        let ids = config.id_params.clone();

        match (function_mode, mode) {
            (FunctionMode::Script, _) => {
                let source = config.script.as_deref().unwrap_or_default();
                let handler = ScriptHandler::new(&data_uri, source, Arc::clone(&self.scripts), store());
                vec![(config.uri.clone(), wrap(Arc::new(handler)))]
            }
            (FunctionMode::Read, SaveInfoMode::Collection) => vec![
                (
                    base_uri(&config.uri),
                    wrap(Arc::new(ReadHandler::all(&data_uri, store()))),
                ),
                (
                    config.uri.clone(),
                    wrap(Arc::new(ReadHandler::one(&data_uri, ids, store()))),
                ),
            ],
            (FunctionMode::Create, SaveInfoMode::Collection) => {
                let handler = CreateHandler::one(
                    &data_uri,
                    ids,
                    config.generate_id,
                    config.generate_id_patterns.clone(),
                    store(),
                );
                vec![(base_uri(&config.uri), wrap(Arc::new(handler)))]
            }
            (FunctionMode::Update, SaveInfoMode::Collection) => vec![(
                config.uri.clone(),
                wrap(Arc::new(UpdateHandler::one(&data_uri, ids, store()))),
            )],
            (FunctionMode::Delete, SaveInfoMode::Collection) => vec![(
                config.uri.clone(),
                wrap(Arc::new(DeleteHandler::one(&data_uri, ids, store()))),
            )],
            (function_mode, _) => {
                let answer = config.answer.clone();
                let handler: Arc<dyn EndpointHandler> = match function_mode {
                    FunctionMode::Create => Arc::new(CreateHandler::fixed(answer, store())),
                    FunctionMode::Update => Arc::new(UpdateHandler::fixed(answer, store())),
                    FunctionMode::Delete => Arc::new(DeleteHandler::fixed(answer, store())),
                    FunctionMode::Read | FunctionMode::Script => {
                        Arc::new(ReadHandler::fixed(answer, store()))
                    }
                };
                vec![(config.uri.clone(), wrap(handler))]
            }
        }
    }

    /// Seed the collection from a JSON answer; records missing ids are skipped
    fn seed(&self, config: &ControllerConfig) {
        let Some(answer) = config.answer.as_deref() else {
            return;
        };
        if !answer.contains('{') && !answer.contains('[') {
            return;
        }
        let records: Vec<Record> = match serde_json::from_str::<serde_json::Value>(answer) {
            Ok(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            Ok(serde_json::Value::Object(map)) => vec![map],
            _ => {
                logger::log_warning(&format!(
                    "Can't put data [{answer}] to collection [{}]: not json",
                    config.uri
                ));
                return;
            }
        };

        let data_uri = normalize(&config.uri);
        for record in records {
            if !CollectionStore::has_all_ids(&record, &config.id_params) {
                logger::log_warning(&format!(
                    "Skipping seed record without ids for [{}]",
                    config.uri
                ));
                continue;
            }
            let key = CollectionStore::build_key(&record, &config.id_params);
            self.store.put(&data_uri, &key, record);
        }
    }
}

fn validate(config: &ControllerConfig) -> Result<(HttpMethod, FunctionMode), MappingError> {
    if config.uri.trim().is_empty() {
        return Err(MappingError::Validation(
            "Controller: Uri must be not blank".into(),
        ));
    }
    let Some(method) = config.method else {
        return Err(MappingError::Validation(
            "Controller: Method must be specified".into(),
        ));
    };
    let Some(function_mode) = config.function_mode else {
        return Err(MappingError::Validation(
            "Controller: function mode must be specified".into(),
        ));
    };
    if function_mode == FunctionMode::Script
        && config.script.as_deref().map_or(true, |s| s.trim().is_empty())
    {
        return Err(MappingError::Validation(
            "Controller: script must be specified".into(),
        ));
    }
    Ok((method, function_mode))
}

/// Bind every planned route; on failure unbind what this call bound
pub(super) async fn bind_all(
    dispatcher: &Dispatcher,
    method: HttpMethod,
    plan: Plan,
) -> Result<Vec<BoundRoute>, crate::mapping::DispatchError> {
    let mut bound = Vec::with_capacity(plan.len());
    for (uri, handler) in plan {
        if let Err(e) = dispatcher.add(method, &uri, handler).await {
            unbind_all(dispatcher, &bound).await;
            return Err(e);
        }
        bound.push(BoundRoute { method, uri });
    }
    Ok(bound)
}

pub(super) async fn unbind_all(dispatcher: &Dispatcher, routes: &[BoundRoute]) {
    for route in routes {
        if !dispatcher.remove(route.method, &route.uri).await {
            logger::log_warning(&format!(
                "Route {} {} was already unbound",
                route.method, route.uri
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EchoScriptEngine, EndpointRequest, UnconfiguredScriptEngine};
    use crate::mapping::persistence::test_support::MemoryPersistence;
    use crate::mapping::MappingKind;
    use serde_json::{json, Value};

    struct Fixture {
        configurator: ControllerConfigurator,
        registry: Arc<Mutex<MappingRegistry>>,
        dispatcher: Arc<Dispatcher>,
        store: Arc<CollectionStore>,
        persistence: Arc<MemoryPersistence>,
    }

    fn fixture(persistence: MemoryPersistence) -> Fixture {
        fixture_with_engine(persistence, Arc::new(UnconfiguredScriptEngine))
    }

    fn fixture_with_engine(persistence: MemoryPersistence, scripts: Arc<dyn ScriptEngine>) -> Fixture {
        let registry = Arc::new(Mutex::new(MappingRegistry::new()));
        let dispatcher = Arc::new(Dispatcher::new());
        let store = Arc::new(CollectionStore::new());
        let persistence = Arc::new(persistence);
        let configurator = ControllerConfigurator::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            Arc::clone(&store),
            persistence.clone(),
            scripts,
        );
        Fixture {
            configurator,
            registry,
            dispatcher,
            store,
            persistence,
        }
    }

    fn controller(method: HttpMethod, uri: &str, mode: FunctionMode) -> ControllerConfig {
        ControllerConfig {
            uri: uri.to_string(),
            method: Some(method),
            function_mode: Some(mode),
            ..ControllerConfig::default()
        }
    }

    async fn call(dispatcher: &Dispatcher, method: HttpMethod, path: &str, body: &str) -> (u16, String) {
        let response = dispatcher
            .route(EndpointRequest::new(method, path).with_body(body))
            .await
            .expect("route should match");
        (response.status, response.body.unwrap_or_default())
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let f = fixture(MemoryPersistence::default());
        let mut blank = controller(HttpMethod::Get, " ", FunctionMode::Read);
        assert!(matches!(
            f.configurator.register(blank.clone()).await,
            Err(MappingError::Validation(_))
        ));

        blank.uri = "/x".into();
        blank.method = None;
        assert!(matches!(
            f.configurator.register(blank.clone()).await,
            Err(MappingError::Validation(_))
        ));

        let no_script = controller(HttpMethod::Get, "/s", FunctionMode::Script);
        let err = f.configurator.register(no_script).await.unwrap_err();
        assert_eq!(err.to_string(), "Controller: script must be specified");
        assert!(f.registry.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_crud_scenario() {
        let f = fixture(MemoryPersistence::default());
        let uri = "/items/{id}";
        for (method, mode) in [
            (HttpMethod::Get, FunctionMode::Read),
            (HttpMethod::Post, FunctionMode::Create),
            (HttpMethod::Delete, FunctionMode::Delete),
        ] {
            f.configurator.register(controller(method, uri, mode)).await.unwrap();
        }

        assert_eq!(call(&f.dispatcher, HttpMethod::Get, "/items", "").await, (200, "[]".into()));

        let (status, body) = call(&f.dispatcher, HttpMethod::Post, "/items", r#"{"id":"1","name":"a"}"#).await;
        assert_eq!(status, 200);
        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created, json!({"id": "1", "name": "a"}));

        let duplicate = call(&f.dispatcher, HttpMethod::Post, "/items", r#"{"id":"1"}"#).await;
        assert_eq!(duplicate, (400, r#"{"description":"key [1] already exist"}"#.into()));

        let (status, body) = call(&f.dispatcher, HttpMethod::Get, "/items/1", "").await;
        assert_eq!(status, 200);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), created);

        let (status, _) = call(&f.dispatcher, HttpMethod::Delete, "/items/1", "").await;
        assert_eq!(status, 200);

        let missing = call(&f.dispatcher, HttpMethod::Get, "/items/1", "").await;
        assert_eq!(missing, (404, r#"{"description":"key [1] not found"}"#.into()));
    }

    #[tokio::test]
    async fn test_duplicate_urls_rejected() {
        let f = fixture(MemoryPersistence::default());
        f.configurator
            .register(controller(HttpMethod::Get, "/items", FunctionMode::Read))
            .await
            .unwrap();

        let err = f
            .configurator
            .register(controller(HttpMethod::Get, "/items/", FunctionMode::Read))
            .await
            .unwrap_err();
        assert!(matches!(err, MappingError::Validation(_)));

        // a collection read would also claim the static base uri
        let err = f
            .configurator
            .register(controller(HttpMethod::Get, "/items/{id}", FunctionMode::Read))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Controller: Duplicated urls: /items");

        assert!(f
            .configurator
            .register(controller(HttpMethod::Post, "/items", FunctionMode::Create))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_static_then_collection_base_conflict() {
        let f = fixture(MemoryPersistence::default());
        f.configurator
            .register(controller(HttpMethod::Get, "/items/{id}", FunctionMode::Read))
            .await
            .unwrap();
        let err = f
            .configurator
            .register(controller(HttpMethod::Get, "/items", FunctionMode::Read))
            .await
            .unwrap_err();
        assert!(matches!(err, MappingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_assigns_sequence_ids_and_persists() {
        let f = fixture(MemoryPersistence::default());
        let first = f
            .configurator
            .register(controller(HttpMethod::Get, "/a/{id}", FunctionMode::Read))
            .await
            .unwrap();
        let second = f
            .configurator
            .register(controller(HttpMethod::Get, "/b", FunctionMode::Read))
            .await
            .unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(first.id_params, vec!["id"]);
        assert_eq!(second.id, "2");
        assert!(second.id_params.is_empty());
        assert_eq!(f.persistence.len(), 2);

        let listed = f.configurator.list().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "1");
        assert_eq!(f.configurator.get("2").await.unwrap().uri, "/b");
    }

    #[tokio::test]
    async fn test_register_then_unregister_restores_state() {
        let f = fixture(MemoryPersistence::default());
        let mut config = controller(HttpMethod::Get, "/items/{id}", FunctionMode::Read);
        config.answer = Some(r#"[{"id":"1"},{"id":"2"}]"#.into());
        let stored = f.configurator.register(config).await.unwrap();
        assert_eq!(f.store.get_all("/items/{id}").len(), 2);
        assert_eq!(f.dispatcher.route_count().await, 2);

        let removed = f.configurator.unregister(&stored.id).await.unwrap();
        assert_eq!(removed, stored);
        assert!(f.registry.lock().await.is_empty());
        assert_eq!(f.dispatcher.route_count().await, 0);
        assert_eq!(f.persistence.len(), 0);
        assert!(f.store.get_all("/items/{id}").is_empty());
    }

    #[tokio::test]
    async fn test_store_kept_while_uri_still_served() {
        let f = fixture(MemoryPersistence::default());
        let mut read = controller(HttpMethod::Get, "/items/{id}", FunctionMode::Read);
        read.answer = Some(r#"{"id":"1"}"#.into());
        let read = f.configurator.register(read).await.unwrap();
        let delete = f
            .configurator
            .register(controller(HttpMethod::Delete, "/items/{id}", FunctionMode::Delete))
            .await
            .unwrap();

        f.configurator.unregister(&delete.id).await.unwrap();
        assert_eq!(f.store.get_all("/items/{id}").len(), 1);
        f.configurator.unregister(&read.id).await.unwrap();
        assert!(f.store.get_all("/items/{id}").is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_rolls_back() {
        let f = fixture(MemoryPersistence::failing());
        let mut config = controller(HttpMethod::Get, "/items/{id}", FunctionMode::Read);
        config.answer = Some(r#"{"id":"1"}"#.into());
        let err = f.configurator.register(config).await.unwrap_err();

        assert!(matches!(err, MappingError::Persistence(_)));
        assert!(f.registry.lock().await.is_empty());
        assert_eq!(f.dispatcher.route_count().await, 0);
        assert!(f.store.get_all("/items/{id}").is_empty());
        assert!(f.configurator.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_already_persisted_is_not_written_again() {
        let existing = MappingConfig::Controller(controller(HttpMethod::Get, "/a", FunctionMode::Read));
        let f = fixture(MemoryPersistence::with_entries(vec![existing]));
        f.persistence
            .fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(f
            .configurator
            .register(controller(HttpMethod::Get, "/a", FunctionMode::Read))
            .await
            .is_ok());
        let loaded = f.persistence.load_all(MappingKind::Controller).await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister_unknown_and_failed_delete() {
        let f = fixture(MemoryPersistence::default());
        assert!(matches!(
            f.configurator.unregister("42").await,
            Err(MappingError::NotFound { .. })
        ));

        let stored = f
            .configurator
            .register(controller(HttpMethod::Get, "/a", FunctionMode::Read))
            .await
            .unwrap();
        f.persistence
            .fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(
            f.configurator.unregister(&stored.id).await,
            Err(MappingError::Persistence(_))
        ));
        assert!(f.configurator.get(&stored.id).await.is_some());
        assert!(f.dispatcher.has_route(HttpMethod::Get, "/a").await);
    }

    #[tokio::test]
    async fn test_static_modes() {
        let f = fixture(MemoryPersistence::default());
        let mut read = controller(HttpMethod::Get, "/hello", FunctionMode::Read);
        read.answer = Some("hi".into());
        f.configurator.register(read).await.unwrap();
        f.configurator
            .register(controller(HttpMethod::Post, "/echo", FunctionMode::Create))
            .await
            .unwrap();

        assert_eq!(call(&f.dispatcher, HttpMethod::Get, "/hello", "").await, (200, "hi".into()));
        assert_eq!(call(&f.dispatcher, HttpMethod::Post, "/echo", "ping").await, (200, "ping".into()));
        assert_eq!(
            call(&f.dispatcher, HttpMethod::Post, "/echo", "").await,
            (400, r#"{"description":"body is null"}"#.into())
        );
    }

    #[tokio::test]
    async fn test_update_collection() {
        let f = fixture(MemoryPersistence::default());
        let mut read = controller(HttpMethod::Get, "/u/{id}", FunctionMode::Read);
        read.answer = Some(r#"{"id":"1","v":1}"#.into());
        f.configurator.register(read).await.unwrap();
        f.configurator
            .register(controller(HttpMethod::Put, "/u/{id}", FunctionMode::Update))
            .await
            .unwrap();

        let (status, _) = call(&f.dispatcher, HttpMethod::Put, "/u/1", r#"{"v":2}"#).await;
        assert_eq!(status, 200);
        let (_, body) = call(&f.dispatcher, HttpMethod::Get, "/u/1", "").await;
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"id": "1", "v": 2}));
    }

    #[tokio::test]
    async fn test_delay_applies_to_request() {
        let f = fixture(MemoryPersistence::default());
        let mut slow = controller(HttpMethod::Get, "/slow", FunctionMode::Read);
        slow.delay_ms = 25;
        f.configurator.register(slow).await.unwrap();
        let started = std::time::Instant::now();
        call(&f.dispatcher, HttpMethod::Get, "/slow", "").await;
        assert!(started.elapsed() >= std::time::Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_script_needs_a_configured_engine() {
        let mut script = controller(HttpMethod::Get, "/s", FunctionMode::Script);
        script.script = Some("hello".into());

        let f = fixture(MemoryPersistence::default());
        let err = f.configurator.register(script.clone()).await.unwrap_err();
        assert!(matches!(err, MappingError::Validation(_)));
        assert_eq!(err.to_string(), "Controller: script engine is not configured");
        assert!(f.registry.lock().await.is_empty());
        assert_eq!(f.persistence.len(), 0);

        let f = fixture_with_engine(MemoryPersistence::default(), Arc::new(EchoScriptEngine));
        f.configurator.register(script).await.unwrap();
        assert_eq!(
            call(&f.dispatcher, HttpMethod::Get, "/s", "").await,
            (200, "hello:GET:/s".into())
        );
    }

    #[tokio::test]
    async fn test_create_and_update_on_same_uri_persist_separately() {
        let f = fixture(MemoryPersistence::default());
        let create = f
            .configurator
            .register(controller(HttpMethod::Post, "/items/{id}", FunctionMode::Create))
            .await
            .unwrap();
        // CREATE claims /items and UPDATE claims /items/{id}, so both fit
        let update = f
            .configurator
            .register(controller(HttpMethod::Post, "/items/{id}", FunctionMode::Update))
            .await
            .unwrap();
        assert_eq!(f.persistence.len(), 2);

        f.configurator.unregister(&update.id).await.unwrap();
        let left = f.persistence.load_all(MappingKind::Controller).await.unwrap();
        assert_eq!(left, vec![MappingConfig::Controller(create.clone()).without_id()]);
        assert!(f.configurator.get(&create.id).await.is_some());
        assert!(f.dispatcher.has_route(HttpMethod::Post, "/items").await);
        assert!(!f.dispatcher.has_route(HttpMethod::Post, "/items/{id}").await);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_no_seed_under_served_uri() {
        let f = fixture(MemoryPersistence::default());
        f.configurator
            .register(controller(HttpMethod::Delete, "/items/{id}", FunctionMode::Delete))
            .await
            .unwrap();

        f.persistence.set_failing(true);
        let mut read = controller(HttpMethod::Get, "/items/{id}", FunctionMode::Read);
        read.answer = Some(r#"[{"id":"9"}]"#.into());
        let err = f.configurator.register(read).await.unwrap_err();

        assert!(matches!(err, MappingError::Persistence(_)));
        assert!(f.store.get_all("/items/{id}").is_empty());
        assert_eq!(
            call(&f.dispatcher, HttpMethod::Delete, "/items/9", "").await,
            (400, r#"{"description":"key [9] not found"}"#.into())
        );
        assert_eq!(f.configurator.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registers_on_same_route() {
        let f = fixture(MemoryPersistence::default());
        let (first, second) = tokio::join!(
            f.configurator
                .register(controller(HttpMethod::Get, "/race", FunctionMode::Read)),
            f.configurator
                .register(controller(HttpMethod::Get, "/race", FunctionMode::Read)),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(MappingError::Validation(_))))
                .count(),
            1
        );
        assert_eq!(f.configurator.list().await.len(), 1);
        assert_eq!(f.dispatcher.route_count().await, 1);
        assert_eq!(f.persistence.len(), 1);
    }
}
