//! Per-user conversational context cache.
//!
//! One TTL-bounded entry per user email, holding the ordered conversation
//! seeded and refreshed with document grounding text. Invariants:
//!
//! - at most one system message, always first when present;
//! - at most one grounding message, always immediately after the system
//!   message (or at index 0), always carrying the most recent text;
//! - the TTL slides on every successful write;
//! - expired or undecodable entries read as absent, never as errors.
//!
//! Mutating operations are read-modify-write under a per-user async lock,
//! so an interleaved reinjection cannot erase a turn appended by a
//! concurrent request for the same user.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::conversation::GROUNDING_FALLBACK;
use crate::models::{ChatMessage, ConversationSession};
use crate::services::grounding::{DocumentTextStore, GroundingText};
use crate::services::session_store::SessionStore;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No session exists for this user")]
    NotFound,

    #[error("Session store error: {0}")]
    Store(#[source] anyhow::Error),
}

impl From<CacheError> for service_core::error::AppError {
    fn from(err: CacheError) -> Self {
        use service_core::error::AppError;
        match err {
            CacheError::NotFound => AppError::NotFound(anyhow::anyhow!("Session not found")),
            CacheError::Store(e) => AppError::InternalError(e),
        }
    }
}

#[derive(Clone)]
pub struct ContextCache {
    store: Arc<dyn SessionStore>,
    ttl_seconds: u64,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ContextCache {
    pub fn new(store: Arc<dyn SessionStore>, ttl_seconds: u64) -> Self {
        Self {
            store,
            ttl_seconds,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn key(user_email: &str) -> String {
        format!("chat:{}", user_email)
    }

    fn user_lock(&self, user_email: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_email.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Non-mutating read. Absent covers never-created, TTL-expired and
    /// corrupt entries alike.
    pub async fn get(
        &self,
        user_email: &str,
    ) -> Result<Option<ConversationSession>, CacheError> {
        self.read(user_email).await
    }

    /// First-time construction of a session, seeded from aggregated
    /// grounding text.
    ///
    /// Fails soft: an empty or failed fetch seeds the fixed fallback text
    /// instead of blocking the turn. Under the user lock an existing
    /// session is returned as-is, so back-to-back bootstraps never
    /// duplicate the seed messages.
    pub async fn bootstrap(
        &self,
        user_email: &str,
        documents: &dyn DocumentTextStore,
    ) -> Result<ConversationSession, CacheError> {
        let lock = self.user_lock(user_email);
        let _guard = lock.lock().await;

        if let Some(existing) = self.read(user_email).await? {
            return Ok(existing);
        }

        let grounding_text = match documents.fetch_aggregated_text(user_email).await {
            Ok(GroundingText::Text(text)) => text,
            Ok(GroundingText::Empty) => {
                tracing::debug!(user_email = %user_email, "No document fragments, seeding fallback grounding");
                GROUNDING_FALLBACK.to_string()
            }
            Err(e) => {
                tracing::warn!(user_email = %user_email, error = %e, "Grounding fetch failed, seeding fallback grounding");
                GROUNDING_FALLBACK.to_string()
            }
        };

        let session = ConversationSession::seeded(&grounding_text);
        self.write(user_email, &session).await?;
        Ok(session)
    }

    /// Append a completed turn (user message then assistant reply) and
    /// refresh the TTL.
    ///
    /// Re-reads the stored session under the user lock and appends to the
    /// current state, so a reinjection that landed after the caller's
    /// earlier read is preserved rather than overwritten.
    pub async fn append_turn(
        &self,
        user_email: &str,
        user_message: ChatMessage,
        assistant_message: ChatMessage,
    ) -> Result<ConversationSession, CacheError> {
        let lock = self.user_lock(user_email);
        let _guard = lock.lock().await;

        let mut session = self
            .read(user_email)
            .await?
            .ok_or(CacheError::NotFound)?;

        session.push(user_message);
        session.push(assistant_message);
        self.write(user_email, &session).await?;
        Ok(session)
    }

    /// Replace the session's grounding message with fresh text.
    ///
    /// Creates the session when absent (bootstrap shape, no fetch); when
    /// present, every existing grounding message is removed and exactly one
    /// new one is inserted right after the system message.
    pub async fn reinject_grounding(
        &self,
        user_email: &str,
        new_grounding_text: &str,
    ) -> Result<ConversationSession, CacheError> {
        let lock = self.user_lock(user_email);
        let _guard = lock.lock().await;

        let session = match self.read(user_email).await? {
            None => ConversationSession::seeded(new_grounding_text),
            Some(mut session) => {
                session.replace_grounding(ChatMessage::grounding_updated(new_grounding_text));
                session
            }
        };

        self.write(user_email, &session).await?;
        Ok(session)
    }

    /// Delete the session. Idempotent: invalidating an absent user is a
    /// no-op.
    pub async fn invalidate(&self, user_email: &str) -> Result<(), CacheError> {
        let lock = self.user_lock(user_email);
        let _guard = lock.lock().await;

        self.store
            .delete(&Self::key(user_email))
            .await
            .map_err(CacheError::Store)
    }

    pub async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.store.health_check().await
    }

    async fn read(&self, user_email: &str) -> Result<Option<ConversationSession>, CacheError> {
        let raw = self
            .store
            .get(&Self::key(user_email))
            .await
            .map_err(CacheError::Store)?;

        match raw {
            None => Ok(None),
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    // A corrupt entry must not break the chat flow; the
                    // caller re-bootstraps as if the session never existed.
                    tracing::warn!(
                        user_email = %user_email,
                        error = %e,
                        "Undecodable session payload, treating as absent"
                    );
                    Ok(None)
                }
            },
        }
    }

    async fn write(
        &self,
        user_email: &str,
        session: &ConversationSession,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(session)
            .map_err(|e| CacheError::Store(anyhow::anyhow!("Failed to encode session: {}", e)))?;

        self.store
            .set_with_ttl(&Self::key(user_email), &payload, self.ttl_seconds)
            .await
            .map_err(CacheError::Store)
    }
}
