/// Common test utilities for integration tests
///
/// Builds the full router on an in-memory store and offers helpers for
/// sending query operations through it.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::{
    auth::password::HashCost, service::BoardService, store::memory::InMemoryStore,
};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "Tr0ub4dor&3";

/// Test context containing the router under test
pub struct TestContext {
    pub app: Router,
}

impl TestContext {
    /// Creates a router over a fresh, empty store
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .expect("test configuration");

        let service = BoardService::new(Arc::new(InMemoryStore::new()), SECRET)
            .with_hash_cost(HashCost::minimal());
        let app = build_router(AppState::with_service(service, config));

        Self { app }
    }

    /// Sends a raw body to the query endpoint
    pub async fn send(&self, token: Option<&str>, body: String) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/v1/query")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();

        read(response).await
    }

    /// Sends one operation to the query endpoint
    pub async fn query(&self, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(token, body.to_string()).await
    }

    /// Sends an operation that is expected to succeed and returns its data
    pub async fn data(&self, token: &str, body: Value) -> Value {
        let (status, body) = self.query(Some(token), body).await;
        assert_eq!(status, StatusCode::OK, "unexpected response: {}", body);
        body["data"].clone()
    }

    /// Registers a user and returns its token
    pub async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .query(
                None,
                json!({ "operation": "register", "username": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);

        body["data"]["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        read(response).await
    }
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Extracts the ids of an array of objects
pub fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
