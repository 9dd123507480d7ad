// Mapping persistence module
// Saves registered controllers and routers to the mappings file

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::mapping::{
    ConfigPersistence, ControllerConfig, MappingConfig, MappingKind, PersistError, RouterConfig,
};

/// Persistent mappings - serialized to the mappings file
/// Ids are assigned per run and never written
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct PersistentMappings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controllers: Vec<ControllerConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routers: Vec<RouterConfig>,
}

impl PersistentMappings {
    fn entries(&self, kind: MappingKind) -> Vec<MappingConfig> {
        match kind {
            MappingKind::Controller => self
                .controllers
                .iter()
                .cloned()
                .map(MappingConfig::Controller)
                .collect(),
            MappingKind::Router => self
                .routers
                .iter()
                .cloned()
                .map(MappingConfig::Router)
                .collect(),
        }
    }

    fn contains(&self, config: &MappingConfig) -> bool {
        self.entries(config.kind())
            .iter()
            .any(|e| e.same_entry(config))
    }

    fn insert(&mut self, config: &MappingConfig) {
        match config.without_id() {
            MappingConfig::Controller(c) => self.controllers.push(c),
            MappingConfig::Router(r) => self.routers.push(r),
        }
    }

    /// Drop the first matching entry only
    fn remove(&mut self, config: &MappingConfig) {
        match config {
            MappingConfig::Controller(_) => remove_first(&mut self.controllers, config),
            MappingConfig::Router(_) => remove_first(&mut self.routers, config),
        }
    }
}

fn remove_first<T>(entries: &mut Vec<T>, config: &MappingConfig)
where
    T: Clone + Into<MappingConfig>,
{
    let found = entries
        .iter()
        .position(|e| Into::<MappingConfig>::into(e.clone()).same_entry(config));
    if let Some(index) = found {
        entries.remove(index);
    }
}

/// Mappings file manager
pub struct FileConfigStore {
    /// Path to mappings file
    path: PathBuf,
    /// Current mappings (cached in memory)
    state: RwLock<PersistentMappings>,
    /// Whether writes reach the disk
    enabled: bool,
}

impl FileConfigStore {
    /// Create a store; with `enabled` false nothing is read or written
    ///
    /// A missing file starts empty. An unreadable one is logged and also
    /// starts empty; the next write replaces it.
    pub fn new(path: &str, enabled: bool) -> Self {
        let path = PathBuf::from(path);
        let state = if enabled && path.exists() {
            match Self::load_state(&path) {
                Ok(state) => {
                    crate::logger::log_info(&format!(
                        "Loaded {} controllers and {} routers from {}",
                        state.controllers.len(),
                        state.routers.len(),
                        path.display()
                    ));
                    state
                }
                Err(e) => {
                    crate::logger::log_error(&format!("Ignoring mappings file: {e}"));
                    PersistentMappings::default()
                }
            }
        } else {
            PersistentMappings::default()
        };

        Self {
            path,
            state: RwLock::new(state),
            enabled,
        }
    }

    /// Load mappings from file
    fn load_state(path: &Path) -> Result<PersistentMappings, PersistError> {
        let content = fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save mappings to file
    fn save_state(&self, state: &PersistentMappings) -> Result<(), PersistError> {
        if !self.enabled {
            return Ok(());
        }

        let content = toml::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }
        fs::write(&self.path, content).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    // Apply a change, keeping the cache untouched when the write fails
    async fn update(&self, change: impl FnOnce(&mut PersistentMappings)) -> Result<(), PersistError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        change(&mut next);
        self.save_state(&next)?;
        *state = next;
        Ok(())
    }
}

#[async_trait]
impl ConfigPersistence for FileConfigStore {
    async fn exists(&self, config: &MappingConfig) -> bool {
        self.state.read().await.contains(config)
    }

    async fn add(&self, config: &MappingConfig) -> Result<(), PersistError> {
        self.update(|state| state.insert(config)).await
    }

    async fn delete(&self, config: &MappingConfig) -> Result<(), PersistError> {
        self.update(|state| state.remove(config)).await
    }

    async fn load_all(&self, kind: MappingKind) -> Result<Vec<MappingConfig>, PersistError> {
        Ok(self.state.read().await.entries(kind))
    }
}
