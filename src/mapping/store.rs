//! Collection store
//!
//! Two-level concurrent map `uri -> (composite key -> record)` backing the
//! collection-mode controllers. Each uri gets its own `DashMap` bucket, so
//! requests against different endpoints never contend.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A stored JSON object
pub type Record = Map<String, Value>;

/// Joins id values into a composite key
pub const KEY_DELIMITER: &str = ":::";

type Bucket = Arc<DashMap<String, Record>>;

#[derive(Debug, Default)]
pub struct CollectionStore {
    buckets: DashMap<String, Bucket>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Clone the bucket handle so the outer shard lock is released before
    // touching the inner map.
    fn bucket(&self, uri: &str) -> Bucket {
        Arc::clone(&self.buckets.entry(uri.to_string()).or_default())
    }

    fn existing_bucket(&self, uri: &str) -> Option<Bucket> {
        self.buckets.get(uri).map(|bucket| Arc::clone(&bucket))
    }

    /// All records of a uri, ordered by key
    pub fn get_all(&self, uri: &str) -> Vec<Record> {
        let Some(bucket) = self.existing_bucket(uri) else {
            return Vec::new();
        };
        let mut entries: Vec<(String, Record)> = bucket
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, record)| record).collect()
    }

    pub fn get(&self, uri: &str, key: &str) -> Option<Record> {
        self.existing_bucket(uri)?
            .get(key)
            .map(|record| record.value().clone())
    }

    pub fn put(&self, uri: &str, key: &str, record: Record) {
        self.bucket(uri).insert(key.to_string(), record);
    }

    /// Insert only when the key is free; returns false if it was taken
    pub fn put_if_absent(&self, uri: &str, key: &str, record: Record) -> bool {
        match self.bucket(uri).entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    /// Replace only when the key exists; returns false if it was missing
    pub fn replace(&self, uri: &str, key: &str, record: Record) -> bool {
        let Some(bucket) = self.existing_bucket(uri) else {
            return false;
        };
        let replaced = bucket
            .get_mut(key)
            .map(|mut existing| *existing = record)
            .is_some();
        replaced
    }

    pub fn contains_key(&self, uri: &str, key: &str) -> bool {
        self.existing_bucket(uri)
            .is_some_and(|bucket| bucket.contains_key(key))
    }

    /// Remove one record, returning it
    pub fn delete(&self, uri: &str, key: &str) -> Option<Record> {
        self.existing_bucket(uri)?
            .remove(key)
            .map(|(_, record)| record)
    }

    /// Drop a whole uri bucket
    pub fn delete_all(&self, uri: &str) {
        self.buckets.remove(uri);
    }

    /// Composite key from a JSON record's id fields
    pub fn build_key(record: &Record, id_params: &[String]) -> String {
        id_params
            .iter()
            .map(|param| record.get(param).map(id_value).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(KEY_DELIMITER)
    }

    /// Composite key from bound path parameters
    pub fn build_key_from_params(params: &HashMap<String, String>, id_params: &[String]) -> String {
        id_params
            .iter()
            .map(|param| params.get(param).map_or("", String::as_str))
            .collect::<Vec<_>>()
            .join(KEY_DELIMITER)
    }

    /// A key is only usable once every id field carries a non-empty value
    pub fn has_all_ids(record: &Record, id_params: &[String]) -> bool {
        id_params
            .iter()
            .all(|param| record.get(param).is_some_and(|v| !id_value(v).is_empty()))
    }
}

/// String form of an id field: strings verbatim, null empty, others as JSON text
pub fn id_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
