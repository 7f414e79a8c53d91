//! Chat-turn and logout handlers.

use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::MessageResponse;
use crate::AppState;
use service_core::error::AppError;

/// Chat turn request.
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// Chat turn response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Run one chat turn for a user.
///
/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    req.validate()?;

    let response = state.chat.chat_turn(&req.user_email, &req.message).await?;
    Ok(Json(ChatResponse { response }))
}

/// Logout request.
#[derive(Debug, Deserialize, Validate)]
pub struct LogoutRequest {
    #[validate(email(message = "Invalid email format"))]
    pub user_email: String,
}

/// Drop the user's conversation session.
///
/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()?;

    state.chat.logout(&req.user_email).await?;
    Ok(Json(MessageResponse {
        message: "Session cleared".to_string(),
    }))
}
