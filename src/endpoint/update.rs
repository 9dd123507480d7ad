use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{answer_or_body, parse_record, EndpointHandler, EndpointRequest, HandlerResponse};
use crate::mapping::CollectionStore;

/// UPDATE controllers: static answer/echo, or overwrite an existing record
pub struct UpdateHandler {
    answer: Option<String>,
    collection: bool,
    uri: String,
    id_params: Vec<String>,
    store: Arc<CollectionStore>,
}

impl UpdateHandler {
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

    fn overwrite(&self, request: EndpointRequest) -> HandlerResponse {
        let Some(body) = request.body else {
            return HandlerResponse::error(400, "body is null");
        };
        let mut record = match parse_record(&body) {
            Ok(record) => record,
            Err(response) => return response,
        };

        let key = CollectionStore::build_key_from_params(&request.path_params, &self.id_params);
        // the path decides identity, not the body
        for param in &self.id_params {
            if let Some(value) = request.path_params.get(param) {
                record.insert(param.clone(), Value::String(value.clone()));
            }
        }

        let response = HandlerResponse::json(200, &Value::Object(record.clone()));
        if self.store.replace(&self.uri, &key, record) {
            response
        } else {
            HandlerResponse::error(400, &format!("key [{key}] not found"))
        }
    }
}

#[async_trait]
impl EndpointHandler for UpdateHandler {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse {
        if self.collection {
            self.overwrite(request)
        } else {
            answer_or_body(self.answer.as_deref(), request.body)
        }
    }

    fn name(&self) -> &'static str {
        "update"
    }
}
