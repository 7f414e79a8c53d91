pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::ChatConfig;
use crate::services::ocr::TextExtractor;
use crate::services::{ChatDb, ChatService, UploadStore};
use service_core::error::AppError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ChatConfig,
    pub db: ChatDb,
    pub chat: ChatService,
    pub ocr: Arc<dyn TextExtractor>,
    pub uploads: UploadStore,
}

pub fn build_router(state: AppState) -> Router {
    // Stored images are served straight from the upload directory, so the
    // URLs returned by the listing endpoint resolve.
    let upload_files = ServeDir::new(state.uploads.root().to_path_buf());

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/chat", post(handlers::chat::chat))
        .route("/logout", post(handlers::chat::logout))
        .route("/upload", post(handlers::documents::upload))
        .route(
            "/list-uploads/:email",
            get(handlers::documents::list_uploads),
        )
        .route("/get-ocr/:email", get(handlers::documents::get_ocr))
        .route("/onboarding", post(handlers::users::onboarding))
        .route("/check-user/:email", get(handlers::users::check_user))
        .route("/add-medicine", post(handlers::users::add_medicine))
        .nest_service("/uploads", upload_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Service health check: MongoDB and the session store must both answer.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "MongoDB health check failed");
        e
    })?;

    state.chat.cache().health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Session store health check failed");
        AppError::InternalError(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": "chat-service",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "mongodb": "up",
            "redis": "up"
        }
    })))
}

async fn readiness_check(State(state): State<AppState>) -> axum::http::StatusCode {
    let db_ok = state.db.health_check().await.is_ok();
    let cache_ok = state.chat.cache().health_check().await.is_ok();
    if db_ok && cache_ok {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}
