//! Document text store boundary.
//!
//! The cache depends on this trait for grounding text; it never talks to
//! MongoDB directly. The typed result separates "user has no documents"
//! from "the fetch itself failed" so callers and tests can tell which
//! happened, while both degrade to the same fallback for the end user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::OcrFragment;

/// Outcome of a successful grounding-text fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundingText {
    /// The user has no document fragments.
    Empty,
    /// Aggregated text over all fragments.
    Text(String),
}

#[async_trait]
pub trait DocumentTextStore: Send + Sync {
    /// Concatenate all of a user's fragments, each prefixed with a
    /// separator carrying file name and capture time, in insertion order.
    async fn fetch_aggregated_text(
        &self,
        user_email: &str,
    ) -> Result<GroundingText, anyhow::Error>;

    /// Persist one extracted-text fragment.
    async fn append_fragment(&self, fragment: &OcrFragment) -> Result<(), anyhow::Error>;
}

/// Render one fragment the way it appears in aggregated grounding text.
pub fn format_fragment(file_name: &str, captured_at: DateTime<Utc>, text: &str) -> String {
    format!(
        "[Document: {}, captured {}]\n{}\n",
        file_name,
        captured_at.format("%Y-%m-%d %H:%M:%S UTC"),
        text
    )
}

/// Aggregate fragments into a single grounding blob.
pub fn aggregate_fragments(fragments: &[OcrFragment]) -> GroundingText {
    if fragments.is_empty() {
        return GroundingText::Empty;
    }

    let mut combined = String::new();
    for fragment in fragments {
        combined.push_str(&format_fragment(
            &fragment.file_name,
            fragment.created_at,
            &fragment.text,
        ));
    }
    GroundingText::Text(combined.trim_end().to_string())
}

/// In-memory fragment store for tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    fragments: std::sync::Mutex<Vec<OcrFragment>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentTextStore for InMemoryDocumentStore {
    async fn fetch_aggregated_text(
        &self,
        user_email: &str,
    ) -> Result<GroundingText, anyhow::Error> {
        let fragments = self
            .fragments
            .lock()
            .map_err(|e| anyhow::anyhow!("Fragment store mutex poisoned: {}", e))?;
        let user_fragments: Vec<OcrFragment> = fragments
            .iter()
            .filter(|f| f.user_email == user_email)
            .cloned()
            .collect();
        Ok(aggregate_fragments(&user_fragments))
    }

    async fn append_fragment(&self, fragment: &OcrFragment) -> Result<(), anyhow::Error> {
        self.fragments
            .lock()
            .map_err(|e| anyhow::anyhow!("Fragment store mutex poisoned: {}", e))?
            .push(fragment.clone());
        Ok(())
    }
}

/// A store whose fetch always fails, for exercising the fallback path.
pub struct FailingDocumentStore;

#[async_trait]
impl DocumentTextStore for FailingDocumentStore {
    async fn fetch_aggregated_text(
        &self,
        _user_email: &str,
    ) -> Result<GroundingText, anyhow::Error> {
        Err(anyhow::anyhow!("document store unreachable"))
    }

    async fn append_fragment(&self, _fragment: &OcrFragment) -> Result<(), anyhow::Error> {
        Err(anyhow::anyhow!("document store unreachable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_preserves_insertion_order_and_annotates_capture_time() {
        let first = OcrFragment::new("a@x.com".into(), "scan1.png".into(), "BP 120/80".into());
        let second = OcrFragment::new("a@x.com".into(), "scan2.png".into(), "BP 130/85".into());

        let GroundingText::Text(text) = aggregate_fragments(&[first.clone(), second.clone()])
        else {
            panic!("expected aggregated text");
        };

        let first_idx = text.find("BP 120/80").unwrap();
        let second_idx = text.find("BP 130/85").unwrap();
        assert!(first_idx < second_idx);
        assert!(text.contains("scan1.png"));
        assert!(text.contains(&first.created_at.format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn no_fragments_is_empty_not_an_error() {
        assert_eq!(aggregate_fragments(&[]), GroundingText::Empty);
    }
}
