//! Startup loader
//!
//! Replays persisted configurations through the configurators: controllers
//! first, then routers. A failing entry is logged and skipped.

use super::model::{MappingConfig, MappingKind};
use super::persistence::ConfigPersistence;
use super::MappingService;
use crate::logger;

/// Outcome of a startup load
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub registered: usize,
    pub failed: usize,
}

pub async fn load_persisted(service: &MappingService, persistence: &dyn ConfigPersistence) -> LoadReport {
    let mut report = LoadReport::default();

    for kind in [MappingKind::Controller, MappingKind::Router] {
        let configs = match persistence.load_all(kind).await {
            Ok(configs) => configs,
            Err(e) => {
                logger::log_error(&format!("Failed to load persisted {kind}s: {e}"));
                continue;
            }
        };

        for config in configs {
            let uri = config.uri().to_string();
            let result = match config {
                MappingConfig::Controller(c) => service.controllers.register(c).await.map(|_| ()),
                MappingConfig::Router(r) => service.routers.register(r).await.map(|_| ()),
            };
            match result {
                Ok(()) => report.registered += 1,
                Err(e) => {
                    report.failed += 1;
                    logger::log_error(&format!("Skipping persisted {kind} [{uri}]: {e}"));
                }
            }
        }
    }

    logger::log_configured_urls(service.registry.lock().await.methods_urls());
    logger::log_debug(&format!(
        "{} routes bound after startup load",
        service.dispatcher.route_count().await
    ));
    report
}
