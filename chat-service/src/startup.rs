//! Application startup and lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;

use crate::config::ChatConfig;
use crate::services::ocr::{HttpOcrClient, TextExtractor};
use crate::services::providers::groq::GroqCompletionProvider;
use crate::services::providers::CompletionProvider;
use crate::services::{
    ChatDb, ChatService, ContextCache, RedisSessionStore, SessionStore, UploadStore,
};
use crate::{build_router, AppState};
use service_core::error::AppError;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration. Connects every
    /// backing store up front so a broken environment fails at startup,
    /// not on the first request.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let db = ChatDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;

        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let session_store: Arc<dyn SessionStore> = Arc::new(
            RedisSessionStore::new(&config.redis.url)
                .await
                .map_err(AppError::InternalError)?,
        );
        let cache = ContextCache::new(session_store, config.session.ttl_seconds);
        tracing::info!(
            ttl_seconds = config.session.ttl_seconds,
            "Initialized context cache"
        );

        let completion: Arc<dyn CompletionProvider> = Arc::new(
            GroqCompletionProvider::new(config.groq.clone()).map_err(AppError::InternalError)?,
        );
        tracing::info!(model = %config.groq.model, "Initialized completion provider");

        let ocr: Arc<dyn TextExtractor> = Arc::new(
            HttpOcrClient::new(&config.ocr.service_url).map_err(AppError::InternalError)?,
        );
        tracing::info!(endpoint = %config.ocr.service_url, "Initialized OCR client");

        let chat = ChatService::new(cache, Arc::new(db.clone()), completion);
        let uploads = UploadStore::new(&config.uploads.dir);

        let state = AppState {
            config: config.clone(),
            db,
            chat,
            ocr,
            uploads,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("chat-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &ChatDb {
        &self.state.db
    }

    /// Run the application until stopped or signalled.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
