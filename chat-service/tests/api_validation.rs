//! Handler-level validation: malformed requests are rejected before any
//! cache or store mutation.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use chat_service::config::{
    ChatConfig, GroqConfig, MongoConfig, OcrConfig, RedisConfig, SessionConfig, UploadConfig,
};
use chat_service::services::context_cache::ContextCache;
use chat_service::services::grounding::InMemoryDocumentStore;
use chat_service::services::ocr::MockTextExtractor;
use chat_service::services::providers::mock::MockCompletionProvider;
use chat_service::services::{ChatDb, ChatService, InMemorySessionStore, UploadStore};
use chat_service::{build_router, AppState};

async fn test_app(uploads_dir: &std::path::Path) -> (axum::Router, ContextCache) {
    let config = ChatConfig {
        common: service_core::config::Config { port: 0 },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "chat_test_db".to_string(),
        },
        redis: RedisConfig {
            url: "redis://localhost:6379".to_string(),
        },
        groq: GroqConfig {
            api_key: "test-api-key".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_base: "http://localhost:9".to_string(),
        },
        ocr: OcrConfig {
            service_url: "http://localhost:9".to_string(),
        },
        session: SessionConfig { ttl_seconds: 3600 },
        uploads: UploadConfig {
            dir: uploads_dir.display().to_string(),
        },
    };

    // The Mongo client connects lazily; validation paths never touch it.
    let db = ChatDb::connect(&config.mongodb.uri, &config.mongodb.database)
        .await
        .expect("lazy mongo client");

    let cache = ContextCache::new(Arc::new(InMemorySessionStore::new()), 3600);
    let chat = ChatService::new(
        cache.clone(),
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(MockCompletionProvider::new()),
    );

    let state = AppState {
        config,
        db,
        chat,
        ocr: Arc::new(MockTextExtractor::with_texts(vec!["text"])),
        uploads: UploadStore::new(uploads_dir),
    };

    (build_router(state), cache)
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn chat_with_invalid_email_is_rejected_without_session_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let (app, cache) = test_app(dir.path()).await;

    let response = app
        .oneshot(json_post(
            "/chat",
            r#"{"user_email":"not-an-email","message":"hi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(cache.get("not-an-email").await.unwrap().is_none());
}

#[tokio::test]
async fn chat_with_missing_message_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, cache) = test_app(dir.path()).await;

    let response = app
        .oneshot(json_post("/chat", r#"{"user_email":"a@x.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(cache.get("a@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn upload_with_invalid_base64_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path()).await;

    let response = app
        .oneshot(json_post(
            "/upload",
            r#"{"user_email":"a@x.com","image":"@@not-base64@@"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_with_missing_email_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = test_app(dir.path()).await;

    let response = app.oneshot(json_post("/logout", r#"{}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
