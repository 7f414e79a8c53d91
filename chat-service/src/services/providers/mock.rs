//! Mock completion provider for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{CompletionProvider, ProviderError};
use crate::models::ChatMessage;

/// Returns canned replies in order, or fails on demand.
#[derive(Default)]
pub struct MockCompletionProvider {
    replies: Mutex<Vec<String>>,
    next: AtomicUsize,
    fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<ChatMessage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::ApiError("mock failure".to_string()));
        }

        let replies = self
            .replies
            .lock()
            .map_err(|_| ProviderError::ApiError("mock mutex poisoned".to_string()))?;
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let content = replies
            .get(index)
            .cloned()
            .unwrap_or_else(|| "mock reply".to_string());

        Ok(ChatMessage::assistant(content))
    }
}
