//! Mapping registry
//!
//! In-memory index of every active controller and router: the per-verb list
//! of consumed uris plus the id-indexed entries. Both configurators share one
//! registry behind a single mutex, so registrations are serialized.

use std::collections::{BTreeMap, HashMap};

use super::model::{ControllerConfig, HttpMethod, RouterConfig};
use crate::routing::template::{normalize, shape_of};

/// One (verb, uri template) bound in the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRoute {
    pub method: HttpMethod,
    pub uri: String,
}

/// A registered configuration and everything it occupies
#[derive(Debug, Clone)]
pub struct MappingEntry<C> {
    pub config: C,
    pub routes: Vec<BoundRoute>,
    pub used_urls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MappingRegistry {
    methods_urls: BTreeMap<HttpMethod, Vec<String>>,
    controllers: HashMap<String, MappingEntry<ControllerConfig>>,
    routers: HashMap<String, MappingEntry<RouterConfig>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any of `uris` is already consumed for this verb
    pub fn first_used<'a>(&self, method: HttpMethod, uris: &'a [String]) -> Option<&'a str> {
        let used = self.methods_urls.get(&method)?;
        uris.iter()
            .find(|uri| {
                let shape = shape_of(uri);
                used.iter().any(|u| shape_of(u) == shape)
            })
            .map(String::as_str)
    }

    pub fn add_urls(&mut self, method: HttpMethod, uris: &[String]) {
        self.methods_urls
            .entry(method)
            .or_default()
            .extend(uris.iter().map(|u| normalize(u)));
    }

    /// Remove one occurrence of each uri
    pub fn remove_urls(&mut self, method: HttpMethod, uris: &[String]) {
        let Some(used) = self.methods_urls.get_mut(&method) else {
            return;
        };
        for uri in uris {
            let uri = normalize(uri);
            if let Some(pos) = used.iter().position(|u| *u == uri) {
                used.remove(pos);
            }
        }
        if used.is_empty() {
            self.methods_urls.remove(&method);
        }
    }

    /// Per-verb uri table, for startup logging
    pub fn methods_urls(&self) -> &BTreeMap<HttpMethod, Vec<String>> {
        &self.methods_urls
    }

    pub fn insert_controller(&mut self, entry: MappingEntry<ControllerConfig>) {
        self.controllers.insert(entry.config.id.clone(), entry);
    }

    pub fn remove_controller(&mut self, id: &str) -> Option<MappingEntry<ControllerConfig>> {
        self.controllers.remove(id)
    }

    pub fn controller(&self, id: &str) -> Option<&MappingEntry<ControllerConfig>> {
        self.controllers.get(id)
    }

    pub fn controllers(&self) -> impl Iterator<Item = &MappingEntry<ControllerConfig>> {
        self.controllers.values()
    }

    /// True if some registered controller keeps data under `uri`
    pub fn uri_still_served(&self, uri: &str) -> bool {
        let uri = normalize(uri);
        self.controllers
            .values()
            .any(|e| normalize(&e.config.uri) == uri)
    }

    pub fn insert_router(&mut self, entry: MappingEntry<RouterConfig>) {
        self.routers.insert(entry.config.id.clone(), entry);
    }

    pub fn remove_router(&mut self, id: &str) -> Option<MappingEntry<RouterConfig>> {
        self.routers.remove(id)
    }

    pub fn router(&self, id: &str) -> Option<&MappingEntry<RouterConfig>> {
        self.routers.get(id)
    }

    pub fn routers(&self) -> impl Iterator<Item = &MappingEntry<RouterConfig>> {
        self.routers.values()
    }

    pub fn is_empty(&self) -> bool {
        self.methods_urls.is_empty() && self.controllers.is_empty() && self.routers.is_empty()
    }
}
