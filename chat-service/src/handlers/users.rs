//! Onboarding, user lookup and medicine handlers.

use axum::extract::{Json, Path, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::MessageResponse;
use crate::models::{Medicine, OcrFragment, UserProfile};
use crate::services::grounding::DocumentTextStore;
use crate::AppState;
use service_core::error::AppError;

/// Onboarding request; mirrors the mobile client's profile form.
#[derive(Debug, Deserialize, Validate)]
pub struct OnboardingRequest {
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,

    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,

    #[validate(length(min = 1, message = "Age is required"))]
    pub age: String,

    #[validate(length(min = 1, message = "Gender is required"))]
    pub gender: String,

    pub height_cm: f64,
    pub weight_kg: f64,
    pub medical_condition: Option<String>,
    pub allergies: Option<String>,

    #[validate(length(min = 1, message = "Emergency contact is required"))]
    pub emergency_contact: String,
}

/// Create or update a user profile.
///
/// POST /onboarding
pub async fn onboarding(
    State(state): State<AppState>,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()?;

    let now = Utc::now();
    let profile = UserProfile {
        user_email: req.user_email,
        full_name: req.full_name,
        phone_number: req.phone_number,
        age: req.age,
        gender: req.gender,
        height_cm: req.height_cm,
        weight_kg: req.weight_kg,
        medical_condition: req.medical_condition,
        allergies: req.allergies,
        emergency_contact: req.emergency_contact,
        created_at: now,
        updated_at: now,
    };

    state.db.upsert_profile(&profile).await?;

    Ok(Json(MessageResponse {
        message: "User onboarding saved successfully".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CheckUserResponse {
    pub exists: bool,
}

/// Whether a profile exists for this email.
///
/// GET /check-user/:email
pub async fn check_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<CheckUserResponse>, AppError> {
    let exists = state.db.user_exists(&email).await?;
    Ok(Json(CheckUserResponse { exists }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMedicineRequest {
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,

    #[validate(length(min = 1, message = "Medicine name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Cause is required"))]
    pub cause: String,

    #[validate(length(min = 1, message = "Repeat period is required"))]
    pub repeat_period: String,
}

/// Record a manually entered medicine and append it to the user's document
/// text, where the next session bootstrap will pick it up. No reinjection
/// happens here.
///
/// POST /add-medicine
pub async fn add_medicine(
    State(state): State<AppState>,
    Json(req): Json<AddMedicineRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()?;

    let medicine = Medicine {
        name: req.name,
        cause: req.cause,
        repeat_period: req.repeat_period,
    };

    let record = state.db.add_medicine(&req.user_email, medicine.clone()).await?;

    let fragment_text = format!(
        "Manually added medicine (not from a document): {}\nCause: {}\nRepeat period: {}",
        medicine.name, medicine.cause, medicine.repeat_period
    );
    state
        .db
        .append_fragment(&OcrFragment::new(
            req.user_email.clone(),
            "medicine_info.txt".to_string(),
            fragment_text,
        ))
        .await
        .map_err(AppError::InternalError)?;

    tracing::info!(
        user_email = %req.user_email,
        medicines = record.medicines.len(),
        "Medicine info added"
    );

    Ok(Json(MessageResponse {
        message: "Medicine info added and document text updated".to_string(),
    }))
}
