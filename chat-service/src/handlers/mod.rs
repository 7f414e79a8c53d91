pub mod chat;
pub mod documents;
pub mod users;

use serde::Serialize;

/// Message response for simple operations.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
