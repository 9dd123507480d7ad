use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{answer_or_body, EndpointHandler, EndpointRequest, HandlerResponse};
use crate::mapping::CollectionStore;

/// DELETE controllers: static answer/echo, or remove one record
pub struct DeleteHandler {
    answer: Option<String>,
    collection: bool,
    uri: String,
    id_params: Vec<String>,
    store: Arc<CollectionStore>,
}

impl DeleteHandler {
    pub fn fixed(answer: Option<String>, store: Arc<CollectionStore>) -> Self {
        Self {
            answer,
            collection: false,
            uri: String::new(),
            id_params: Vec::new(),
            store,
        }
    }

    pub fn one(uri: &str, id_params: Vec<String>, store: Arc<CollectionStore>) -> Self {
        Self {
            answer: None,
            collection: true,
            uri: uri.to_string(),
            id_params,
            store,
        }
    }
}

#[async_trait]
impl EndpointHandler for DeleteHandler {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse {
        if !self.collection {
            return answer_or_body(self.answer.as_deref(), request.body);
        }
        let key = CollectionStore::build_key_from_params(&request.path_params, &self.id_params);
        match self.store.delete(&self.uri, &key) {
            Some(record) => HandlerResponse::json(200, &Value::Object(record)),
            None => HandlerResponse::error(400, &format!("key [{key}] not found")),
        }
    }

    fn name(&self) -> &'static str {
        "delete"
    }
}
