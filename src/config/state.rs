// Application state module
// Shared by the endpoint listener and the management API

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::types::Config;
use crate::mapping::MappingService;

/// Application state
pub struct AppState {
    pub config: Config,

    /// Registered controllers and routers with their dispatcher and store
    pub mappings: MappingService,

    // Cached config values for fast access without locks
    pub cached_access_log: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: &Config, mappings: MappingService) -> Self {
        Self {
            config: config.clone(),
            mappings,
            cached_access_log: Arc::new(AtomicBool::new(config.logging.access_log)),
        }
    }

    pub fn access_log_enabled(&self) -> bool {
        self.cached_access_log.load(Ordering::Relaxed)
    }
}
