#![allow(dead_code)]

pub mod memory_store;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use book_backend::AppState;
use book_backend::config::Config;
use book_backend::http::{Generation, GenerationError, GenerationRequest, TextGenerator};
use book_backend::models::{User, UserRole};
use book_backend::routes::create_router;
use book_backend::utils::token;

pub use memory_store::MemoryStore;

pub const JWT_SECRET: &str = "integration-test-secret";

/// Stand-in for the text-generation service. Every request it receives is
/// kept in `requests`, which stays reachable after the generator is moved into
/// the app.
pub struct FakeGenerator {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub fail: bool,
    pub requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl FakeGenerator {
    pub fn with_content(content: &str) -> Self {
        FakeGenerator {
            content: content.to_string(),
            prompt_tokens: 1200,
            completion_tokens: 2400,
            fail: false,
            requests: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        FakeGenerator {
            fail: true,
            ..FakeGenerator::with_content("")
        }
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn model_name(&self) -> &str {
        "gpt-4o"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(GenerationError::Status {
                status: 503,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(Generation {
            content: self.content.clone(),
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
        })
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_maxage: 3600,
        port: 0,
        llm_url: "http://localhost:0".to_string(),
        llm_api_key: "test-key".to_string(),
        model_name: "gpt-4o".to_string(),
        frontend_url: "http://localhost:3000".to_string(),
    }
}

pub fn build_app(store: Arc<MemoryStore>, generator: FakeGenerator) -> Router {
    create_router(AppState {
        env: Arc::new(test_config()),
        db_client: store,
        generator: Arc::new(generator),
    })
}

/// Insert a user with `role` and return it together with a bearer token.
pub fn login_as(store: &MemoryStore, name: &str, role: UserRole) -> (User, String) {
    let user = store.insert_user(name, role);
    let token = token::create_token(&user.id.to_string(), JWT_SECRET.as_bytes(), 3600)
        .expect("token creation should succeed");
    (user, token)
}

/// Fire one request at the router and return the status and parsed JSON body
/// (`Null` for an empty body).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Create a project through the API and return its id.
pub async fn create_project(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = post(
        app,
        "/api/projects",
        token,
        serde_json::json!({
            "title": title,
            "genre": "Contemporary Romance",
            "tropes": ["enemies to lovers", "small town"],
            "pov": "first_person",
            "heat_level": "mild"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

/// Create a chapter through the API and return its id.
pub async fn create_chapter(app: &Router, token: &str, project_id: &str, number: i32) -> String {
    let (status, body) = post(
        app,
        "/api/chapters",
        token,
        serde_json::json!({
            "project_id": project_id,
            "chapter_number": number,
            "target_word_count": 2000
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}
