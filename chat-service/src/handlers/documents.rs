//! Upload, upload-listing and aggregated-text handlers.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::grounding::{DocumentTextStore, GroundingText};
use crate::AppState;
use service_core::error::AppError;

/// Upload request: a base64-encoded image.
#[derive(Debug, Deserialize, Validate)]
pub struct UploadRequest {
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,

    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub path: String,
    pub extracted_text: String,
}

/// Accept an image, extract its text, persist the fragment and refresh the
/// live conversation's grounding message.
///
/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    req.validate()?;

    let image = base64::engine::general_purpose::STANDARD
        .decode(&req.image)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid base64 image: {}", e)))?;

    let path = state.uploads.save_image(&req.user_email, &image).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.png".to_string());

    // Extraction happens before any fragment or session write, so a failed
    // OCR call leaves no state behind.
    let text = state.ocr.extract(&image).await.map_err(|e| {
        tracing::error!(user_email = %req.user_email, error = %e, "OCR extraction failed");
        AppError::BadGateway(format!("OCR processing failed: {}", e))
    })?;

    state
        .chat
        .ingest_document(&req.user_email, &file_name, &text)
        .await?;

    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            message: "Upload and OCR success".to_string(),
            path: path.display().to_string(),
            extracted_text: text,
        }),
    ))
}

/// List a user's stored uploads as URLs under `/uploads`, where the static
/// file service resolves them.
///
/// GET /list-uploads/:email
pub async fn list_uploads(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let files = state.uploads.list(&email).await?;
    let urls = files
        .into_iter()
        .map(|file| format!("/uploads/{}/{}", email, file))
        .collect();
    Ok(Json(urls))
}

#[derive(Debug, Serialize)]
pub struct AggregatedTextResponse {
    pub email: String,
    pub ocr_texts: String,
}

/// Aggregated grounding text for a user; empty string when there are no
/// fragments.
///
/// GET /get-ocr/:email
pub async fn get_ocr(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AggregatedTextResponse>, AppError> {
    let text = match state
        .db
        .fetch_aggregated_text(&email)
        .await
        .map_err(AppError::InternalError)?
    {
        GroundingText::Text(text) => text,
        GroundingText::Empty => String::new(),
    };

    Ok(Json(AggregatedTextResponse {
        email,
        ocr_texts: text,
    }))
}
