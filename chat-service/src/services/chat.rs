//! Chat-turn and upload orchestration over the context cache.
//!
//! Per chat turn: read (or bootstrap) the session, append the user message
//! locally, ask the completion provider, append both messages with a
//! refreshed expiry. Per upload: persist the fragment, then reinject the
//! fresh text as the session's single grounding message.

use std::sync::Arc;

use service_core::error::AppError;

use crate::models::{ChatMessage, OcrFragment};
use crate::services::context_cache::ContextCache;
use crate::services::grounding::{format_fragment, DocumentTextStore};
use crate::services::providers::{CompletionProvider, COMPLETION_FALLBACK};

#[derive(Clone)]
pub struct ChatService {
    cache: ContextCache,
    documents: Arc<dyn DocumentTextStore>,
    completion: Arc<dyn CompletionProvider>,
}

impl ChatService {
    pub fn new(
        cache: ContextCache,
        documents: Arc<dyn DocumentTextStore>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            cache,
            documents,
            completion,
        }
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    /// Run one chat turn and return the assistant's reply.
    ///
    /// A failed completion degrades to the fixed fallback reply; it never
    /// corrupts or blocks the session.
    pub async fn chat_turn(&self, user_email: &str, message: &str) -> Result<String, AppError> {
        let session = match self.cache.get(user_email).await? {
            Some(session) => session,
            None => {
                self.cache
                    .bootstrap(user_email, self.documents.as_ref())
                    .await?
            }
        };

        let user_message = ChatMessage::user(message);

        let mut outbound = session.messages;
        outbound.push(user_message.clone());

        let assistant_message = match self.completion.complete(&outbound).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(user_email = %user_email, error = %e, "Completion failed, substituting fallback reply");
                ChatMessage::assistant(COMPLETION_FALLBACK)
            }
        };

        let reply = assistant_message.content.clone();
        self.cache
            .append_turn(user_email, user_message, assistant_message)
            .await?;

        Ok(reply)
    }

    /// Persist a freshly extracted fragment and refresh the live session's
    /// grounding message with it.
    pub async fn ingest_document(
        &self,
        user_email: &str,
        file_name: &str,
        text: &str,
    ) -> Result<(), AppError> {
        let fragment = OcrFragment::new(
            user_email.to_string(),
            file_name.to_string(),
            text.to_string(),
        );

        self.documents
            .append_fragment(&fragment)
            .await
            .map_err(AppError::InternalError)?;

        // The session carries the fresh fragment only; the full aggregate
        // is re-read on the next bootstrap.
        let fresh = format_fragment(&fragment.file_name, fragment.created_at, &fragment.text);
        self.cache
            .reinject_grounding(user_email, fresh.trim_end())
            .await?;

        Ok(())
    }

    /// Drop the user's session (logout). Safe to call when absent.
    pub async fn logout(&self, user_email: &str) -> Result<(), AppError> {
        self.cache.invalidate(user_email).await?;
        Ok(())
    }
}
