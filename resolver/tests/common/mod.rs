// Not every helper is used in every test
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chat_storage::store::{InMemoryBackend, SingleTableStore};
use http_body_util::BodyExt;
use resolver::{server, state::ChatServices, types::Environment};
use serde_json::Value;
use tower::ServiceExt;

/// Router wired to an in-memory table
pub struct TestSetup {
    pub router: Router,
    pub backend: Arc<InMemoryBackend>,
}

impl TestSetup {
    pub fn new() -> Self {
        // Initialize tracing for tests
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init()
            .ok();

        let backend = Arc::new(InMemoryBackend::new());
        let store = Arc::new(SingleTableStore::new(backend.clone()));
        let router = server::router(Environment::Development, ChatServices::new(store));

        Self { router, backend }
    }

    /// Sends a request and returns status and parsed JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    /// Resolves one field with the given arguments
    pub async fn resolve(&self, field: &str, arguments: Value) -> (StatusCode, Value) {
        let payload = serde_json::json!({ "field": field, "arguments": arguments });
        let request = Request::builder()
            .method("POST")
            .uri("/resolve")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        self.send(request).await
    }
}
