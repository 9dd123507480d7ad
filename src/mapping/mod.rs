//! Mapping module
//!
//! Runtime registration of synthetic REST endpoints:
//! - Controller and router configurations
//! - Registry of active mappings and the uris they consume
//! - Collection store behind collection-mode controllers
//! - Persistence seam and startup replay

mod controller;
mod error;
mod id;
pub mod loader;
mod model;
pub mod persistence;
mod registry;
mod router;
mod store;

pub use controller::ControllerConfigurator;
pub use error::{DispatchError, MappingError, PersistError, ScriptError};
pub use id::{IdGenerator, IdPattern};
pub use model::{ControllerConfig, FunctionMode, HttpMethod, MappingConfig, MappingKind, RouterConfig};
pub use persistence::ConfigPersistence;
pub use registry::MappingRegistry;
pub use router::RouterConfigurator;
pub use store::{CollectionStore, Record};

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::endpoint::ScriptEngine;
use crate::proxy::ProxyClient;
use crate::routing::Dispatcher;

/// Everything needed to register endpoints and serve them
pub struct MappingService {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<CollectionStore>,
    pub registry: Arc<Mutex<MappingRegistry>>,
    pub controllers: ControllerConfigurator,
    pub routers: RouterConfigurator,
}

impl MappingService {
    pub fn new(
        persistence: Arc<dyn ConfigPersistence>,
        proxy: Arc<dyn ProxyClient>,
        scripts: Arc<dyn ScriptEngine>,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new());
        let store = Arc::new(CollectionStore::new());
        let registry = Arc::new(Mutex::new(MappingRegistry::new()));

        let controllers = ControllerConfigurator::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            Arc::clone(&store),
            Arc::clone(&persistence),
            scripts,
        );
        let routers = RouterConfigurator::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            persistence,
            proxy,
        );

        Self {
            dispatcher,
            store,
            registry,
            controllers,
            routers,
        }
    }
}
