//! OCR extraction boundary.
//!
//! The extraction algorithm itself lives in a sidecar service; this module
//! only carries the narrow client the upload path calls.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR service error: {0}")]
    ServiceError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from an uploaded image.
    async fn extract(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Client for an HTTP OCR sidecar.
pub struct HttpOcrClient {
    client: Client,
    endpoint: String,
}

impl HttpOcrClient {
    pub fn new(service_url: &str) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: format!("{}/extract", service_url.trim_end_matches('/')),
        })
    }
}

#[derive(Serialize)]
struct ExtractRequest {
    image: String,
    language: &'static str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    text: String,
}

#[async_trait]
impl TextExtractor for HttpOcrClient {
    async fn extract(&self, image: &[u8]) -> Result<String, OcrError> {
        let request = ExtractRequest {
            image: base64::engine::general_purpose::STANDARD.encode(image),
            language: "eng",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OcrError::ServiceError(format!("status {}", status)));
        }

        let extracted: ExtractResponse = response
            .json()
            .await
            .map_err(|e| OcrError::ServiceError(format!("Invalid response body: {}", e)))?;

        Ok(extracted.text)
    }
}

/// Fixed-text extractor for tests.
pub struct MockTextExtractor {
    texts: std::sync::Mutex<Vec<String>>,
}

impl MockTextExtractor {
    /// Yields the given texts in order, repeating the last one after.
    pub fn with_texts(texts: Vec<&str>) -> Self {
        Self {
            texts: std::sync::Mutex::new(texts.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl TextExtractor for MockTextExtractor {
    async fn extract(&self, _image: &[u8]) -> Result<String, OcrError> {
        let mut texts = self
            .texts
            .lock()
            .map_err(|_| OcrError::ServiceError("mock mutex poisoned".to_string()))?;
        if texts.len() > 1 {
            Ok(texts.remove(0))
        } else {
            texts
                .first()
                .cloned()
                .ok_or_else(|| OcrError::ServiceError("no mock text configured".to_string()))
        }
    }
}
