use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{EndpointHandler, EndpointRequest, HandlerResponse};
use crate::mapping::CollectionStore;

enum ReadMode {
    Static(Option<String>),
    All,
    One,
}

/// READ controllers: fixed answer, whole collection, or one record
pub struct ReadHandler {
    mode: ReadMode,
    uri: String,
    id_params: Vec<String>,
    store: Arc<CollectionStore>,
}

impl ReadHandler {
    pub fn fixed(answer: Option<String>, store: Arc<CollectionStore>) -> Self {
        Self {
            mode: ReadMode::Static(answer),
            uri: String::new(),
            id_params: Vec::new(),
            store,
        }
    }

    /// List every record stored under `uri`
    pub fn all(uri: &str, store: Arc<CollectionStore>) -> Self {
        Self {
            mode: ReadMode::All,
            uri: uri.to_string(),
            id_params: Vec::new(),
            store,
        }
    }

    /// Fetch the record addressed by the path parameters
    pub fn one(uri: &str, id_params: Vec<String>, store: Arc<CollectionStore>) -> Self {
        Self {
            mode: ReadMode::One,
            uri: uri.to_string(),
            id_params,
            store,
        }
    }
}

#[async_trait]
impl EndpointHandler for ReadHandler {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse {
        match &self.mode {
            ReadMode::Static(answer) => HandlerResponse::ok(answer.clone().unwrap_or_default()),
            ReadMode::All => {
                let records = self
                    .store
                    .get_all(&self.uri)
                    .into_iter()
                    .map(Value::Object)
                    .collect();
                HandlerResponse::json(200, &Value::Array(records))
            }
            ReadMode::One => {
                let key = CollectionStore::build_key_from_params(&request.path_params, &self.id_params);
                match self.store.get(&self.uri, &key) {
                    Some(record) => HandlerResponse::json(200, &Value::Object(record)),
                    None => HandlerResponse::error(404, &format!("key [{key}] not found")),
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "read"
    }
}
