use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{answer_or_body, parse_record, EndpointHandler, EndpointRequest, HandlerResponse};
use crate::mapping::{CollectionStore, IdGenerator, IdPattern};

enum CreateMode {
    Static(Option<String>),
    One {
        generate_id: bool,
        patterns: HashMap<String, IdPattern>,
    },
}

/// CREATE controllers
pub struct CreateHandler {
    mode: CreateMode,
    uri: String,
    id_params: Vec<String>,
    store: Arc<CollectionStore>,
    ids: IdGenerator,
}

impl CreateHandler {
    pub fn fixed(answer: Option<String>, store: Arc<CollectionStore>) -> Self {
        Self {
            mode: CreateMode::Static(answer),
            uri: String::new(),
            id_params: Vec::new(),
            store,
            ids: IdGenerator::new(),
        }
    }

    /// Insert new records into the collection stored under `uri`
    pub fn one(
        uri: &str,
        id_params: Vec<String>,
        generate_id: bool,
        patterns: HashMap<String, IdPattern>,
        store: Arc<CollectionStore>,
    ) -> Self {
        Self {
            mode: CreateMode::One {
                generate_id,
                patterns,
            },
            uri: uri.to_string(),
            id_params,
            store,
            ids: IdGenerator::new(),
        }
    }

    fn insert(
        &self,
        body: Option<String>,
        generate_id: bool,
        patterns: &HashMap<String, IdPattern>,
    ) -> HandlerResponse {
        let Some(body) = body else {
            return HandlerResponse::error(400, "body is null");
        };
        let mut record = match parse_record(&body) {
            Ok(record) => record,
            Err(response) => return response,
        };

        if generate_id {
            for param in &self.id_params {
                let id = self.ids.generate_or_uuid(patterns.get(param).copied());
                record.insert(param.clone(), Value::String(id));
            }
        } else if !CollectionStore::has_all_ids(&record, &self.id_params) {
            return HandlerResponse::error(400, "some ids are missing");
        }

        let key = CollectionStore::build_key(&record, &self.id_params);
        let response = HandlerResponse::json(200, &Value::Object(record.clone()));
        if self.store.put_if_absent(&self.uri, &key, record) {
            response
        } else {
            HandlerResponse::error(400, &format!("key [{key}] already exist"))
        }
    }
}

#[async_trait]
impl EndpointHandler for CreateHandler {
    async fn handle(&self, request: EndpointRequest) -> HandlerResponse {
        match &self.mode {
            CreateMode::Static(answer) => answer_or_body(answer.as_deref(), request.body),
            CreateMode::One {
                generate_id,
                patterns,
            } => self.insert(request.body, *generate_id, patterns),
        }
    }

    fn name(&self) -> &'static str {
        "create"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::HttpMethod;

    const URI: &str = "/items/{id}";

    fn post(body: &str) -> EndpointRequest {
        EndpointRequest::new(HttpMethod::Post, "/items").with_body(body)
    }

    fn collection(generate_id: bool, patterns: &[(&str, IdPattern)]) -> (CreateHandler, Arc<CollectionStore>) {
        let store = Arc::new(CollectionStore::new());
        let patterns = patterns
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect();
        let handler = CreateHandler::one(URI, vec!["id".into()], generate_id, patterns, Arc::clone(&store));
        (handler, store)
    }

    #[tokio::test]
    async fn test_static_answer_then_echo() {
        let store = Arc::new(CollectionStore::new());
        let answered = CreateHandler::fixed(Some("created".into()), Arc::clone(&store));
        assert_eq!(answered.handle(post("x")).await.body.as_deref(), Some("created"));

        let echo = CreateHandler::fixed(None, store);
        assert_eq!(echo.handle(post("payload")).await.body.as_deref(), Some("payload"));
        assert_eq!(echo.handle(post("")).await.status, 400);
    }

    #[tokio::test]
    async fn test_create_then_duplicate() {
        let (handler, store) = collection(false, &[]);
        let created = handler.handle(post(r#"{"id":"1","n":"a"}"#)).await;
        assert_eq!(created.status, 200);
        assert!(store.contains_key(URI, "1"));

        let duplicate = handler.handle(post(r#"{"id":"1","n":"b"}"#)).await;
        assert_eq!(duplicate.status, 400);
        assert_eq!(
            duplicate.body.as_deref(),
            Some(r#"{"description":"key [1] already exist"}"#)
        );
        assert_eq!(store.get(URI, "1").unwrap()["n"], "a");
    }

    #[tokio::test]
    async fn test_rejects_bad_bodies() {
        let (handler, _) = collection(false, &[]);
        let empty = handler.handle(post("")).await;
        assert_eq!(empty.body.as_deref(), Some(r#"{"description":"body is null"}"#));

        let not_json = handler.handle(post("oops")).await;
        assert_eq!(
            not_json.body.as_deref(),
            Some(r#"{"description":"data [oops] is not json"}"#)
        );

        let missing = handler.handle(post(r#"{"n":"a"}"#)).await;
        assert_eq!(
            missing.body.as_deref(),
            Some(r#"{"description":"some ids are missing"}"#)
        );
    }

    #[tokio::test]
    async fn test_generated_sequence_ids() {
        let (handler, store) = collection(true, &[("id", IdPattern::Sequence)]);
        let first = handler.handle(post(r#"{"n":"a"}"#)).await;
        let second = handler.handle(post(r#"{"id":"ignored","n":"b"}"#)).await;
        let first: Value = serde_json::from_str(first.body.as_deref().unwrap()).unwrap();
        let second: Value = serde_json::from_str(second.body.as_deref().unwrap()).unwrap();
        assert_eq!(first["id"], "1");
        assert_eq!(second["id"], "2");
        assert_eq!(store.get_all(URI).len(), 2);
    }

    #[tokio::test]
    async fn test_generated_ids_default_to_uuid() {
        let (handler, _) = collection(true, &[]);
        let created = handler.handle(post(r#"{"n":"a"}"#)).await;
        let value: Value = serde_json::from_str(created.body.as_deref().unwrap()).unwrap();
        assert!(uuid::Uuid::parse_str(value["id"].as_str().unwrap()).is_ok());
    }
}
