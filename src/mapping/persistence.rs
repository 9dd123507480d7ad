//! Persistence seam for mapping configurations

use async_trait::async_trait;

use super::error::PersistError;
use super::model::{MappingConfig, MappingKind};

/// Durable storage of registered configurations
///
/// Entries are identified by their whole configuration; ids are runtime-only.
/// `delete` removes a single matching entry.
#[async_trait]
pub trait ConfigPersistence: Send + Sync {
    async fn exists(&self, config: &MappingConfig) -> bool;

    async fn add(&self, config: &MappingConfig) -> Result<(), PersistError>;

    async fn delete(&self, config: &MappingConfig) -> Result<(), PersistError>;

    async fn load_all(&self, kind: MappingKind) -> Result<Vec<MappingConfig>, PersistError>;
}
