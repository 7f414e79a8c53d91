//! Stored uploads are listed as URLs and those URLs serve the file bytes
//! back from the upload directory.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::Engine;
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

async fn test_app(uploads_dir: &std::path::Path) -> axum::Router {
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

    // The Mongo client connects lazily; these paths never touch it.
    let db = ChatDb::connect(&config.mongodb.uri, &config.mongodb.database)
        .await
        .expect("lazy mongo client");

    let cache = ContextCache::new(Arc::new(InMemorySessionStore::new()), 3600);
    let chat = ChatService::new(
        cache,
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(MockCompletionProvider::new()),
    );

    let state = AppState {
        config,
        db,
        chat,
        ocr: Arc::new(MockTextExtractor::with_texts(vec!["BP 120/80"])),
        uploads: UploadStore::new(uploads_dir),
    };

    build_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn uploaded_image_is_served_at_its_listed_url() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let image_bytes: &[u8] = b"fake png bytes";
    let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);
    let body = serde_json::json!({ "user_email": "a@x.com", "image": encoded }).to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/list-uploads/a@x.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let urls: Vec<String> = serde_json::from_slice(&listing).unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with("/uploads/a@x.com/image_"));

    // The listed URL resolves to the stored bytes.
    let response = app.oneshot(get(&urls[0])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&served[..], image_bytes);
}

#[tokio::test]
async fn listing_for_user_with_no_uploads_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let response = app
        .oneshot(get("/list-uploads/nobody@x.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let urls: Vec<String> = serde_json::from_slice(&listing).unwrap();
    assert!(urls.is_empty());
}

#[tokio::test]
async fn missing_upload_is_a_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path()).await;

    let response = app
        .oneshot(get("/uploads/a@x.com/image_0.png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
