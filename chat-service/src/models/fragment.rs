//! OCR fragment model: one extracted-text record per processed upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document-text fragment persisted after OCR extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrFragment {
    /// Owning user identity.
    pub user_email: String,

    /// Name of the uploaded file the text came from.
    pub file_name: String,

    /// Extracted text.
    pub text: String,

    /// Capture time, surfaced in the aggregated grounding text.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl OcrFragment {
    pub fn new(user_email: String, file_name: String, text: String) -> Self {
        Self {
            user_email,
            file_name,
            text,
            created_at: Utc::now(),
        }
    }
}
